//! Common error types for oee-edge.
//!
//! This module provides shared error types that are used across multiple crates.

use crate::ids::BackendId;
use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the gateway.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No base URL is configured for a backend.
    #[error("backend not configured: {0}")]
    BackendNotConfigured(BackendId),
}
