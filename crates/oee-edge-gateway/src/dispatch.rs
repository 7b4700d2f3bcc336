//! The request dispatcher.
//!
//! Every request that is not served by a fixed router entry lands here.
//! A request moves through three stages:
//!
//! 1. the route table picks the first route whose method and pattern match,
//! 2. the auth gate runs when the route requires it,
//! 3. the route's target serves it (a backend forward or the logout handler).
//!
//! A failure at any stage becomes an [`ApiError`] response.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::auth::authenticate;
use crate::error::ApiError;
use crate::forward::{InboundRequest, UpstreamClient};
use crate::handlers::logout;
use crate::route_table::RouteTarget;
use crate::state::GatewayState;

/// Fallback handler that routes a request through the route table.
pub async fn dispatch<U>(
    State(state): State<Arc<GatewayState<U>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    U: UpstreamClient + 'static,
{
    let inbound = InboundRequest {
        method,
        query: uri.query().map(str::to_string),
        headers,
        body,
    };

    match handle(&state, uri.path(), inbound).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Route, authenticate and serve one request.
///
/// # Errors
///
/// Returns `NoRouteMatch` when no route matches, the auth gate's error when
/// a protected route rejects the caller, and the forwarder's error when the
/// backend call fails.
pub async fn handle<U>(
    state: &GatewayState<U>,
    path: &str,
    inbound: InboundRequest,
) -> Result<Response, ApiError>
where
    U: UpstreamClient,
{
    let Some(matched) = state.routes.match_route(&inbound.method, path) else {
        tracing::debug!(method = %inbound.method, path, "No route matched");
        return Err(ApiError::NoRouteMatch);
    };
    let route = matched.route;

    let user = if route.requires_auth {
        Some(authenticate(&state.codec, &inbound.headers)?)
    } else {
        None
    };

    match &route.target {
        RouteTarget::Logout => {
            let user = user.ok_or(ApiError::MissingToken)?;
            logout::logout(&state.codec, &user, &inbound.headers)
        }
        RouteTarget::Backend(target) => {
            state
                .forwarder
                .forward(route, target, &matched.params, inbound)
                .await
        }
    }
}
