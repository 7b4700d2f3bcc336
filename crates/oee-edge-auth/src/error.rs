//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("missing bearer token")]
    MissingToken,

    /// The token could not be parsed or decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token signature does not match the shared secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token has expired.
    #[error("token expired")]
    ExpiredToken,

    /// An internal error occurred while signing.
    #[error("internal error: {0}")]
    Internal(String),
}
