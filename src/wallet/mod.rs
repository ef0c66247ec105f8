//! Ephemeral wallets for tests, tracked per provisioner and removed at the end of the test.

pub mod command;
pub mod keys;
pub mod provisioner;

pub use command::{CommandOutput, WalletCommand};
pub use keys::{KeyFile, Keypair, Wallet};
pub use provisioner::{CleanupReport, WalletProvisioner, WalletRecord};
