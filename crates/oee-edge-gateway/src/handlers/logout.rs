//! Logout handler.
//!
//! Tokens are stateless, so logout cannot revoke the presented token. The
//! handler mints a zero-lifetime token for the caller, re-runs the auth gate
//! over the original headers and confirms the logout.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use oee_edge_auth::TokenCodec;

use crate::auth::{authenticate, AuthUser};
use crate::error::ApiError;

/// Logout response.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Confirmation message.
    pub message: &'static str,
}

/// Log out an authenticated caller.
///
/// The presented token stays valid until its own expiry.
///
/// # Errors
///
/// Returns an auth error if signing fails or the second gate pass rejects
/// the request.
pub fn logout(
    codec: &TokenCodec,
    user: &AuthUser,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let _expired = codec.sign(&user.subject, Duration::ZERO)?;

    let confirmed = authenticate(codec, headers)?;
    tracing::info!(subject = %confirmed.subject, "User logged out");

    Ok((StatusCode::OK, Json(LogoutResponse { message: "logged out" })).into_response())
}
