//! Scoped local chain fixture.
//!
//! [`LocalChain::start`] launches the node, waits for readiness and builds the client;
//! [`LocalChain::shutdown`] (or dropping the chain) tears the process group down.
//! [`with_local_chain`] pairs the two around a test body so teardown runs on every exit path,
//! including a panicking body.
//!
//! ```no_run
//! use localnet_harness::{FixtureOutcome, HarnessConfig, with_local_chain};
//!
//! # fn example() -> Result<(), localnet_harness::HarnessError> {
//! let config = HarnessConfig::load()?;
//! match with_local_chain(&config, Some("--no-purge"), |client| client.url().to_string())? {
//!     FixtureOutcome::Skipped { reason } => eprintln!("skipped: {reason}"),
//!     FixtureOutcome::Completed(url) => assert_eq!(url, "ws://127.0.0.1:9945"),
//! }
//! # Ok(())
//! # }
//! ```

use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};
use url::Url;

use crate::{
    client::{ClientFactory, EndpointClientFactory, NodeClient},
    config::HarnessConfig,
    error::{HarnessError, HarnessResult},
    node::{NodeProcess, Ready, ReadinessSpec, TeardownReport, wait_ready},
};

/// Result of running a test body inside the fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureOutcome<T> {
    /// The harness is not configured; the body did not run and no node was spawned.
    Skipped { reason: String },
    Completed(T),
}

impl<T> FixtureOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, FixtureOutcome::Skipped { .. })
    }

    pub fn completed(self) -> Option<T> {
        match self {
            FixtureOutcome::Completed(value) => Some(value),
            FixtureOutcome::Skipped { .. } => None,
        }
    }
}

/// A ready node and the client bound to it.
#[derive(Debug)]
pub struct LocalChain<C = NodeClient> {
    client: C,
    ready: Ready,
    node: NodeProcess,
}

impl LocalChain<NodeClient> {
    pub fn start(config: &HarnessConfig, args: Option<&str>) -> HarnessResult<Self> {
        Self::start_with(config, args, &EndpointClientFactory)
    }
}

impl<C> LocalChain<C> {
    /// Launches the node, blocks until it is ready and builds the client with `factory`.
    ///
    /// Fails with [`HarnessError::ConfigurationMissing`] before spawning anything when no launch
    /// script is configured. A node that never becomes ready is torn down before returning.
    pub fn start_with<F>(config: &HarnessConfig, args: Option<&str>, factory: &F) -> HarnessResult<Self>
    where
        F: ClientFactory<Client = C>,
    {
        let Some(script) = config.launch_script() else {
            warn!("LOCALNET_SH_PATH env variable is not set, local chain test skipped");
            return Err(HarnessError::ConfigurationMissing);
        };
        let endpoint = Url::parse(&config.endpoint)?;

        let spec = ReadinessSpec::from_config(config);
        let mut node = NodeProcess::start(script, args, config.grace_period())?;
        let ready = wait_ready(&mut node, &spec)?;
        let client = factory.build(&endpoint)?;

        Ok(Self { client, ready, node })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn node(&self) -> &NodeProcess {
        &self.node
    }

    pub fn ready(&self) -> &Ready {
        &self.ready
    }

    /// Tears the node down now instead of on drop, returning how it went down.
    pub fn shutdown(mut self) -> HarnessResult<TeardownReport> {
        self.node.teardown()
    }
}

/// Runs `body` against a ready local chain and always tears the chain down afterwards.
pub fn with_local_chain<T>(
    config: &HarnessConfig,
    args: Option<&str>,
    body: impl FnOnce(&NodeClient) -> T,
) -> HarnessResult<FixtureOutcome<T>> {
    with_local_chain_using(config, args, &EndpointClientFactory, body)
}

/// [`with_local_chain`] with a caller-provided client factory.
///
/// Setup errors are returned before `body` runs. Teardown faults are logged and never replace the
/// body's own result; a panic in `body` is resumed once the chain is down.
pub fn with_local_chain_using<F, T>(
    config: &HarnessConfig,
    args: Option<&str>,
    factory: &F,
    body: impl FnOnce(&F::Client) -> T,
) -> HarnessResult<FixtureOutcome<T>>
where
    F: ClientFactory,
{
    let chain = match LocalChain::start_with(config, args, factory) {
        Ok(chain) => chain,
        Err(e) if e.is_skip() => return Ok(FixtureOutcome::Skipped { reason: e.to_string() }),
        Err(e) => return Err(e),
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| body(chain.client())));

    match chain.shutdown() {
        Ok(report) => debug!(escalated = report.escalated; "Local chain torn down"),
        Err(e) => warn!("Local chain teardown failed: {e}"),
    }

    match result {
        Ok(value) => Ok(FixtureOutcome::Completed(value)),
        Err(payload) => panic::resume_unwind(payload),
    }
}
