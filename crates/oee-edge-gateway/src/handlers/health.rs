//! Health check endpoint.
//!
//! This module provides the public health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::forward::UpstreamClient;
use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Number of routes in the route table.
    pub routes: usize,
}

/// Health check handler.
///
/// Public; it does not call any backend.
///
/// # Example
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "routes": 23
/// }
/// ```
pub async fn health<U>(State(state): State<Arc<GatewayState<U>>>) -> impl IntoResponse
where
    U: UpstreamClient + 'static,
{
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        routes: state.routes.len(),
    };

    (StatusCode::OK, Json(response))
}
