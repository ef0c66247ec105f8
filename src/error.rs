//! Error types for the local chain harness.
//!
//! [`HarnessError`] covers every failure the fixture can report. Setup errors abort before
//! the test body runs; teardown and cleanup faults are logged by their owners and never
//! surface through this type into a test result.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// No launch script is configured. Tests treat this as a skip rather than a failure.
    #[error("LOCALNET_SH_PATH is not set, local chain tests are skipped")]
    ConfigurationMissing,

    /// The readiness pattern was not observed before the deadline.
    #[error("Node not started in time: `{pattern}` not seen within {timeout:?}")]
    ReadinessTimeout { pattern: String, timeout: Duration },

    /// The node closed its output before printing the readiness pattern.
    #[error("Node output closed after {lines_read} lines without `{pattern}`")]
    PrematureStreamEnd { pattern: String, lines_read: usize },

    /// The node was spawned without a readable stdout.
    #[error("Node output stream is not available")]
    OutputUnavailable,

    #[error("Invalid launch arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to spawn `{}`: {source}", .script.display())]
    Spawn {
        script: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to signal process group {pgid}: {source}")]
    Signal {
        pgid: i32,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("Invalid client endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Invalid wallet uri: {0:?}")]
    InvalidWalletUri(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Whether the error means "do not run this test" rather than "this test failed".
    pub fn is_skip(&self) -> bool {
        matches!(self, HarnessError::ConfigurationMissing)
    }
}

// Convenience alias
pub type HarnessResult<T> = Result<T, HarnessError>;
