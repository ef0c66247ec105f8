pub mod key_value_encoder;

use std::path::Path;

use anyhow::{Context, bail};
use log::{LevelFilter, debug, info};
use log4rs::{
    Config,
    append::console::{ConsoleAppender, Target},
    config::{Appender, Deserializers, RawConfig, Root},
};

use crate::log::key_value_encoder::{KeyValueEncoder, KeyValueEncoderDeserializer};

const EXTERNAL_CONFIG: &str = "log4rs.yml";
const EMBEDDED_CONFIG: &str = include_str!("../../resources/default_log4rs.yml");
const TEST_PATTERN: &str = "{d(%H:%M:%S%.3f)} {l:5} [{t}] {m}";

fn deserializers() -> Deserializers {
    let mut deserializers = Deserializers::default();
    deserializers.insert("key_value", KeyValueEncoderDeserializer);
    deserializers
}

/// Initializes logging for the `localnet` binary.
///
/// A `log4rs.yml` in the working directory wins over the embedded defaults and is watched for
/// changes; the embedded configuration is static.
pub fn init_logging() -> anyhow::Result<()> {
    let external = Path::new(EXTERNAL_CONFIG);
    if external.exists() {
        log4rs::init_file(external, deserializers()).with_context(|| format!("Invalid {EXTERNAL_CONFIG}"))?;
        info!(path = EXTERNAL_CONFIG; "Logging initialized from external configuration");
        return Ok(());
    }

    log4rs::init_config(config_from_yaml(EMBEDDED_CONFIG)?)?;
    debug!("Logging initialized from embedded defaults");
    Ok(())
}

/// Builds a logging configuration from YAML, with the `key_value` encoder available.
fn config_from_yaml(yaml: &str) -> anyhow::Result<Config> {
    let raw: RawConfig = serde_yaml::from_str(yaml).context("Logging configuration is not valid YAML")?;

    let (appenders, errors) = raw.appenders_lossy(&deserializers());
    if !errors.is_empty() {
        bail!("Invalid log appenders: {errors:?}");
    }

    Config::builder()
        .appenders(appenders)
        .loggers(raw.loggers())
        .build(raw.root())
        .context("Invalid logging configuration")
}

/// Installs a stderr logger for tests. Safe to call from every test; only the first call wins.
pub fn try_init_test_logging() {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(KeyValueEncoder::new(TEST_PATTERN)))
        .build();

    let Ok(config) = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(Root::builder().appender("console").build(LevelFilter::Debug))
    else {
        return;
    };

    // A logger is already installed when this fails
    let _ = log4rs::init_config(config);
}
