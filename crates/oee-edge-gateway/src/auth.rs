//! The auth gate.
//!
//! This module turns the `Authorization: Bearer <token>` header of an
//! inbound request into an [`AuthUser`], or rejects the request.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use oee_edge_auth::{bearer_token, Claims, TokenCodec};
use oee_edge_core::SubjectId;

use crate::error::ApiError;

/// An authenticated caller, decoded from a verified token.
///
/// Read-only for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// The token subject.
    pub subject: SubjectId,
    /// When the token was issued.
    pub issued_at: Option<DateTime<Utc>>,
    /// When the token expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Create an `AuthUser` from verified claims.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        }
    }
}

/// Run the auth gate over a request's headers.
///
/// # Errors
///
/// Returns `MissingToken` if there is no bearer token, `ExpiredToken` if the
/// token is past its expiry, and `InvalidToken` for any other verification
/// failure.
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let token = bearer_token(header).map_err(|e| {
        tracing::debug!("Rejected request without bearer token");
        ApiError::from(e)
    })?;

    let claims = codec.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    Ok(AuthUser::from_claims(&claims))
}
