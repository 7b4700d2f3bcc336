//! Core types and utilities for oee-edge.
//!
//! This crate provides the foundational types shared by the gateway crates:
//!
//! - **Identifiers**: the token subject (`SubjectId`) and the backend
//!   service identifiers (`BackendId`)
//! - **Error types**: Common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use oee_edge_core::{BackendId, SubjectId};
//!
//! // Subjects issued by the user service are usually numeric
//! let subject = SubjectId::from(42_i64);
//! assert_eq!(subject.to_string(), "42");
//!
//! // Backends are named in configuration
//! assert_eq!(BackendId::Indicators.url_env_var(), "INDICADORES_SERVICE_URL");
//! assert_eq!(BackendId::Indicators.to_string(), "indicators");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;

pub use error::{CoreError, Result};
pub use ids::{BackendId, SubjectId};
