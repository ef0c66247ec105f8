use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{config::HarnessConfig, error::HarnessResult};

#[derive(Parser)]
#[command(name = "localnet")]
#[command(about = "Launch and tear down a local chain for end-to-end tests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the local chain, wait until it imports block #1 and keep it up until Ctrl-C
    Up {
        #[arg(short, long, help = "Extra arguments appended to the launch script", allow_hyphen_values = true)]
        args: Option<String>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the resolved harness configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    #[arg(short, long, help = "Path to a TOML configuration file; LOCALNET_* variables take precedence")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Launch script, overrides LOCALNET_SH_PATH")]
    pub script: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> HarnessResult<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load_from(path)?,
            None => HarnessConfig::load()?,
        };
        if let Some(script) = &self.script {
            config.sh_path = Some(script.clone());
        }
        Ok(config)
    }
}
