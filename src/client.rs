//! Construction of the RPC client handed to a test once the node is ready.
//!
//! The harness does not speak the node's RPC protocol. [`ClientFactory`] is the seam where a test
//! plugs in its own client; [`EndpointClientFactory`] only validates and carries the endpoint.

use log::debug;
use url::Url;

use crate::error::HarnessResult;

/// Builds a client bound to the node endpoint. Called once, after readiness is confirmed.
pub trait ClientFactory {
    type Client;

    fn build(&self, endpoint: &Url) -> HarnessResult<Self::Client>;
}

impl<C, F> ClientFactory for F
where
    F: Fn(&Url) -> HarnessResult<C>,
{
    type Client = C;

    fn build(&self, endpoint: &Url) -> HarnessResult<C> {
        self(endpoint)
    }
}

/// Handle to the node's RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeClient {
    endpoint: Url,
}

impl NodeClient {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn url(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointClientFactory;

impl ClientFactory for EndpointClientFactory {
    type Client = NodeClient;

    fn build(&self, endpoint: &Url) -> HarnessResult<NodeClient> {
        debug!(endpoint:% = endpoint; "Building node client");
        Ok(NodeClient {
            endpoint: endpoint.clone(),
        })
    }
}

/// Parses `endpoint` and builds a [`NodeClient`] for it.
pub fn build_client(endpoint: &str) -> HarnessResult<NodeClient> {
    EndpointClientFactory.build(&Url::parse(endpoint)?)
}
