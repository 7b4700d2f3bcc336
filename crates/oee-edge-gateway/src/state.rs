//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.
//! Everything in it is immutable after startup.

use std::sync::Arc;

use oee_edge_auth::{AuthConfig, TokenCodec};

use crate::config::GatewayConfig;
use crate::forward::{Forwarder, UpstreamClient};
use crate::route_table::RouteTable;

/// Shared application state for the gateway.
pub struct GatewayState<U>
where
    U: UpstreamClient,
{
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// The token codec used by the auth gate.
    pub codec: TokenCodec,
    /// The route table.
    pub routes: RouteTable,
    /// The backend forwarder.
    pub forwarder: Forwarder<U>,
}

impl<U> GatewayState<U>
where
    U: UpstreamClient,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        auth: &AuthConfig,
        routes: RouteTable,
        upstream: Arc<U>,
    ) -> Self {
        let forwarder = Forwarder::new(upstream, config.backends.clone());
        Self {
            config,
            codec: TokenCodec::new(auth),
            routes,
            forwarder,
        }
    }
}
