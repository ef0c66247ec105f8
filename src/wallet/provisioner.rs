use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::HarnessConfig,
    error::HarnessResult,
    wallet::{
        command::WalletCommand,
        keys::{Keypair, Wallet},
    },
};

pub const DEFAULT_WALLET_NAME: &str = "default";
pub const DEFAULT_HOTKEY: &str = "default";

/// One ephemeral wallet handed to a test.
#[derive(Debug, Clone)]
pub struct WalletRecord {
    pub keypair: Keypair,
    pub wallet: Wallet,
    pub path: PathBuf,
    pub command: WalletCommand,
}

/// Outcome of removing every tracked wallet directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Paths that were already gone. Not an error.
    pub absent: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Creates wallets for one test and removes all of them afterwards.
///
/// Every created directory is tracked exactly once. [`WalletProvisioner::cleanup_all`] is also
/// run on drop, so a panicking test still leaves no wallets behind.
#[derive(Debug)]
pub struct WalletProvisioner {
    root: PathBuf,
    wallet_cli: String,
    endpoint: Option<String>,
    tracked: Vec<PathBuf>,
}

impl WalletProvisioner {
    pub fn new(root: impl Into<PathBuf>, wallet_cli: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            wallet_cli: wallet_cli.into(),
            endpoint: None,
            tracked: Vec::new(),
        }
    }

    /// A provisioner rooted at the configured wallet root, with commands bound to the node endpoint.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.wallet_root(), config.wallet_cli.clone()).with_endpoint(config.endpoint.clone())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tracked_paths(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Creates a fresh wallet for `uri` in its own directory and starts tracking it.
    ///
    /// Two calls never share a directory, even for the same URI.
    pub fn setup(&mut self, uri: &str) -> HarnessResult<WalletRecord> {
        let keypair = Keypair::from_uri(uri)?;

        fs::create_dir_all(&self.root)?;
        let path = self
            .root
            .join(format!("wallet-{}-{}", slug(uri), Uuid::new_v4().simple()));
        fs::create_dir(&path)?;
        self.track(path.clone());

        let wallet = Wallet::create(&path, DEFAULT_WALLET_NAME, DEFAULT_HOTKEY, &keypair)?;
        let mut command = WalletCommand::new(self.wallet_cli.clone(), path.clone(), &wallet.name, &wallet.hotkey);
        if let Some(endpoint) = &self.endpoint {
            command = command.with_endpoint(endpoint.clone());
        }

        info!(uri = uri, path:% = path.display(); "Wallet provisioned");
        Ok(WalletRecord {
            keypair,
            wallet,
            path,
            command,
        })
    }

    fn track(&mut self, path: PathBuf) {
        if !self.tracked.contains(&path) {
            self.tracked.push(path);
        }
    }

    /// Removes every tracked directory tree and forgets them.
    ///
    /// Best effort: missing paths are skipped, other failures are logged and reported but never
    /// returned as errors.
    pub fn cleanup_all(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for path in self.tracked.drain(..) {
            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    debug!(path:% = path.display(); "Wallet removed");
                    report.removed.push(path);
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => report.absent.push(path),
                Err(e) => {
                    warn!(path:% = path.display(); "Failed to remove wallet: {e}");
                    report.failed.push(path);
                },
            }
        }
        report
    }
}

impl Drop for WalletProvisioner {
    fn drop(&mut self) {
        if !self.tracked.is_empty() {
            self.cleanup_all();
        }
    }
}

/// Directory-safe form of a dev URI: `//Alice` becomes `alice`.
fn slug(uri: &str) -> String {
    let slug: String = uri
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() { "dev".to_string() } else { slug.to_string() }
}
