use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;

pub const ENV_PREFIX: &str = "LOCALNET";
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9945";
pub const DEFAULT_READY_PATTERN: &str = "Imported #1";
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 20 * 60;
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 1000;
pub const DEFAULT_WALLET_CLI: &str = "wallet-cli";

/// Harness settings, resolved from an optional TOML file and `LOCALNET_*` environment variables.
///
/// Only `sh_path` (`LOCALNET_SH_PATH`) has no default; without it local chain tests are skipped.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    pub sh_path: Option<PathBuf>,
    pub endpoint: String,
    pub ready_pattern: String,
    pub ready_timeout_secs: u64,
    pub grace_period_ms: u64,
    pub wallet_root: Option<PathBuf>,
    pub wallet_cli: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            sh_path: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ready_pattern: DEFAULT_READY_PATTERN.to_string(),
            ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            wallet_root: None,
            wallet_cli: DEFAULT_WALLET_CLI.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Reads the configuration from the process environment.
    pub fn load() -> HarnessResult<Self> {
        Self::build(None, None)
    }

    /// Reads the configuration from a TOML file, with the environment taking precedence.
    pub fn load_from(path: &Path) -> HarnessResult<Self> {
        Self::build(Some(path), None)
    }

    /// Reads the configuration from an explicit variable map instead of the process environment.
    pub fn from_env_source(vars: HashMap<String, String>) -> HarnessResult<Self> {
        Self::build(None, Some(vars))
    }

    fn build(path: Option<&Path>, vars: Option<HashMap<String, String>>) -> HarnessResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!(path:% = path.display(); "Loading harness configuration file");
            builder = builder.add_source(config::File::from(path));
        }
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .try_parsing(true)
            .source(vars);

        let cfg: HarnessConfig = builder.add_source(environment).build()?.try_deserialize()?;
        debug!(
            endpoint = cfg.endpoint.as_str(),
            configured = cfg.launch_script().is_some();
            "Harness configuration resolved"
        );
        Ok(cfg)
    }

    /// The node launch script, treating an empty value as unset.
    pub fn launch_script(&self) -> Option<&Path> {
        self.sh_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn wallet_root(&self) -> PathBuf {
        self.wallet_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}
