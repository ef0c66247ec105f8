use std::io;

use log::{
    Record,
    kv::{Error, Key, Value, VisitSource},
};
use log4rs::encode::{Encode, Write, pattern::PatternEncoder};
use serde::Deserialize;

const DEFAULT_PATTERN: &str = "{d} {l} {m}";

#[derive(Debug, Deserialize)]
pub struct KeyValueEncoderConfig {
    pub pattern: Option<String>,
}

/// Pattern encoder that appends the record's structured key-values as ` key=value` pairs.
///
/// Values containing whitespace are quoted so node output lines stay readable.
#[derive(Debug)]
pub struct KeyValueEncoder {
    delegate: PatternEncoder,
}

impl KeyValueEncoder {
    pub fn new(pattern: &str) -> Self {
        Self {
            delegate: PatternEncoder::new(pattern),
        }
    }
}

impl Encode for KeyValueEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        self.delegate.encode(w, record)?;

        let mut pairs = PairWriter { writer: w, io_err: None };
        if record.key_values().visit(&mut pairs).is_err() {
            if let Some(io_err) = pairs.io_err {
                return Err(io_err.into());
            }
        }

        w.write_all(b"\n")?;
        Ok(())
    }
}

struct PairWriter<'a> {
    writer: &'a mut dyn Write,
    io_err: Option<io::Error>,
}

impl<'kvs> VisitSource<'kvs> for PairWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        let rendered = value.to_string();
        let result = if rendered.chars().any(char::is_whitespace) {
            write!(self.writer, " {key}={rendered:?}")
        } else {
            write!(self.writer, " {key}={rendered}")
        };

        result.map_err(|e| {
            self.io_err = Some(e);
            Error::msg("io error while writing key-values")
        })
    }
}

pub struct KeyValueEncoderDeserializer;

impl log4rs::config::Deserialize for KeyValueEncoderDeserializer {
    type Trait = dyn Encode;
    type Config = KeyValueEncoderConfig;

    fn deserialize(
        &self,
        config: KeyValueEncoderConfig,
        _: &log4rs::config::Deserializers,
    ) -> anyhow::Result<Box<dyn Encode>> {
        let pattern = config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
        Ok(Box::new(KeyValueEncoder::new(pattern)))
    }
}
