use std::{
    ffi::OsStr,
    path::PathBuf,
    process::{Command, Output},
};

use log::debug;

use crate::error::HarnessResult;

/// Captured result of a wallet CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        }
    }
}

/// Runs the wallet CLI against one provisioned wallet.
///
/// Every invocation gets `--wallet-path`, `--wallet-name` and `--wallet-hotkey` appended, plus
/// `--network <endpoint>` when the helper is bound to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletCommand {
    program: String,
    wallet_path: PathBuf,
    wallet_name: String,
    hotkey: String,
    endpoint: Option<String>,
}

impl WalletCommand {
    pub fn new(program: impl Into<String>, wallet_path: PathBuf, wallet_name: &str, hotkey: &str) -> Self {
        Self {
            program: program.into(),
            wallet_path,
            wallet_name: wallet_name.to_string(),
            hotkey: hotkey.to_string(),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The full argument list for `args`, without the program name.
    pub fn arguments<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut all: Vec<String> = args
            .into_iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect();
        all.extend([
            "--wallet-path".to_string(),
            self.wallet_path.to_string_lossy().into_owned(),
            "--wallet-name".to_string(),
            self.wallet_name.clone(),
            "--wallet-hotkey".to_string(),
            self.hotkey.clone(),
        ]);
        if let Some(endpoint) = &self.endpoint {
            all.extend(["--network".to_string(), endpoint.clone()]);
        }
        all
    }

    /// An unstarted [`Command`] for callers that need their own stdio or environment.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let arguments = self.arguments(args);
        debug!(program = self.program.as_str(), args:? = arguments; "Running wallet command");
        let mut command = Command::new(&self.program);
        command.args(arguments);
        command
    }

    /// Runs the CLI to completion and captures its output.
    pub fn run<I, S>(&self, args: I) -> HarnessResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.command(args).output()?;
        Ok(output.into())
    }
}
