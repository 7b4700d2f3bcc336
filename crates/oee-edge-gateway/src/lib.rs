//! HTTP edge gateway for the OEE services.
//!
//! The gateway is the single public entry point in front of the user,
//! indicators and mock-data backends. It handles:
//!
//! - bearer token verification (HS256, shared secret)
//! - matching requests against an ordered route table
//! - forwarding to the owning backend and mapping its answer
//! - a local logout endpoint
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Dashboard clients                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      oee-edge-gateway                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │ Route table │ │  Auth gate  │ │     Forwarder       │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌────────────┐  ┌──────────┐
//!        │  User    │   │ Indicators │  │  Mock    │
//!        │ service  │   │  service   │  │  data    │
//!        └──────────┘   └────────────┘  └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use oee_edge_gateway::{create_router, GatewayState, HttpUpstream, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let routes = settings.gateway.route_table()?;
//! let upstream = Arc::new(HttpUpstream::new(settings.gateway.upstream_timeout())?);
//!
//! let listen_addr = settings.gateway.listen_addr.clone();
//! let state = GatewayState::new(settings.gateway, &settings.auth, routes, upstream);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod forward;
pub mod handlers;
pub mod route_table;
pub mod routes;
pub mod state;

pub use config::{Backends, ConfigError, GatewayConfig, Settings};
pub use error::ApiError;
pub use forward::{Forwarder, HttpUpstream, UpstreamClient, UpstreamOutcome, UpstreamRequest};
pub use route_table::{default_routes, RouteSpec, RouteTable};
pub use routes::create_router;
pub use state::GatewayState;

pub use auth::AuthUser;
