//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::any::Any;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::dispatch::dispatch;
use crate::error::ApiError;
use crate::forward::UpstreamClient;
use crate::handlers::health;
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check (public)
/// - everything else - dispatched through the route table
pub fn create_router<U>(state: GatewayState<U>) -> Router
where
    U: UpstreamClient + 'static,
{
    // Extract config values before moving state
    let cors_layer = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health::<U>))
        .fallback(dispatch::<U>)
        // Body limit (innermost)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::map_response(payload_too_large_as_json))
        // Outer middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any)
    } else {
        let origins: Vec<_> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any)
    }
}

/// Give body-limit rejections the gateway's JSON error shape.
///
/// Relayed backend JSON keeps its body; only plain-text 413s produced by the
/// limit layer or the body extractor are rewritten.
async fn payload_too_large_as_json(response: Response) -> Response {
    let is_plain_text = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(true, |v| v.starts_with("text/plain"));

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && is_plain_text {
        tracing::debug!("Rejected oversized request body");
        return ApiError::PayloadTooLarge.into_response();
    }
    response
}

/// Turn a handler panic into a generic 500.
#[allow(clippy::needless_pass_by_value)]
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");
    ApiError::Internal(detail).into_response()
}
