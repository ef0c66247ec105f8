//! Local chain harness for end-to-end tests.
//!
//! Launches a node from the script named by `LOCALNET_SH_PATH` as its own process group, waits for
//! it to import its first block, hands the test a client for `ws://127.0.0.1:9945` and tears the
//! whole group down afterwards. [`WalletProvisioner`] creates throwaway wallets and removes them
//! when the test is done.

#[cfg(not(unix))]
compile_error!("localnet-harness drives POSIX process groups and only builds on unix targets");

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod fixture;
pub mod log;
pub mod node;
pub mod wallet;

pub use crate::client::{ClientFactory, NodeClient, build_client};
pub use crate::config::HarnessConfig;
pub use crate::error::{HarnessError, HarnessResult};
pub use crate::fixture::{FixtureOutcome, LocalChain, with_local_chain, with_local_chain_using};
pub use crate::node::{NodeProcess, NodeState, ReadinessSpec, TeardownReport};
pub use crate::wallet::{CleanupReport, WalletProvisioner, WalletRecord};
