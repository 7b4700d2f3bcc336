//! Bearer token authentication for oee-edge.
//!
//! This crate provides the token codec used by the gateway's auth gate:
//!
//! - HS256 signing and verification with a shared secret
//! - Claims extraction with distinct expiry and tampering errors
//! - `Authorization: Bearer` header parsing
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│   bearer_token   │
//! │   (auth gate)    │     │   (extraction)   │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │   TokenCodec     │
//!                          │   (HS256)        │
//!                          └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  shared secret   │
//!                          │  + clock         │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use oee_edge_auth::{AuthConfig, TokenCodec};
//! use oee_edge_core::SubjectId;
//!
//! let codec = TokenCodec::new(&AuthConfig::new("shared-secret"));
//!
//! let token = codec.sign(&SubjectId::from(7_i64), Duration::from_secs(3600)).unwrap();
//! let claims = codec.verify(&token).unwrap();
//!
//! assert_eq!(claims.sub, SubjectId::from(7_i64));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;

pub mod error;
pub mod token;

pub use error::{AuthError, Result};
pub use token::{bearer_token, Claims, TokenCodec};

/// Configuration for token signing and verification.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret, also known to the user service.
    pub secret: String,
}

impl AuthConfig {
    /// Create a configuration for the given shared secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}
