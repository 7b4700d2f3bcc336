//! Core identifier types for oee-edge.
//!
//! This module provides the token subject identifier and the identifiers of
//! the internal services the gateway forwards to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity a bearer token was issued for.
///
/// The user service issues tokens for numeric user ids, but string subjects
/// are accepted as well so that tokens minted by other issuers still decode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    /// A numeric user id.
    Numeric(i64),
    /// An opaque string subject.
    Text(String),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// One of the internal services reachable through the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// User and authentication service.
    User,
    /// OEE indicators service.
    Indicators,
    /// Mock data generator control service.
    Mock,
}

impl BackendId {
    /// All known backends, in configuration order.
    pub const ALL: [Self; 3] = [Self::User, Self::Indicators, Self::Mock];

    /// The lowercase name used in configuration and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Indicators => "indicators",
            Self::Mock => "mock",
        }
    }

    /// The environment variable holding this backend's base URL.
    #[must_use]
    pub const fn url_env_var(&self) -> &'static str {
        match self {
            Self::User => "USER_SERVICE_URL",
            Self::Indicators => "INDICADORES_SERVICE_URL",
            Self::Mock => "MOCK_SERVICE_URL",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
