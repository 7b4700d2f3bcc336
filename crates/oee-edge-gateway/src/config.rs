//! Gateway configuration types.
//!
//! All configuration is resolved once at startup from the process
//! environment (after `.env` loading in `main`) and is immutable afterwards.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use oee_edge_auth::AuthConfig;
use oee_edge_core::{BackendId, CoreError};
use thiserror::Error;

use crate::route_table::{default_routes, RouteError, RouteSpec, RouteTable};

/// A result type using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The offending variable.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The routes file could not be read.
    #[error("failed to read routes file {path}: {source}")]
    RoutesFile {
        /// Path of the routes file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The routes file is not a valid route list.
    #[error("failed to parse routes file: {0}")]
    RoutesParse(#[from] serde_json::Error),

    /// The route list is inconsistent.
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),
}

/// Base URLs of the backend services, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct Backends {
    urls: HashMap<BackendId, String>,
}

impl Backends {
    /// Register a backend base URL. A trailing `/` is dropped.
    #[must_use]
    pub fn with(mut self, backend: BackendId, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.urls
            .insert(backend, base_url.trim_end_matches('/').to_string());
        self
    }

    /// Get the base URL of a backend.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::BackendNotConfigured` if no URL was registered.
    pub fn base_url(&self, backend: BackendId) -> oee_edge_core::Result<&str> {
        self.urls
            .get(&backend)
            .map(String::as_str)
            .ok_or(CoreError::BackendNotConfigured(backend))
    }
}

/// Configuration for the gateway service.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:3000").
    pub listen_addr: String,

    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Timeout for a single backend call, in seconds.
    pub upstream_timeout_seconds: u64,

    /// Optional JSON file replacing the built-in route list.
    pub routes_file: Option<PathBuf>,

    /// Backend base URLs.
    pub backends: Backends,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:3000".to_string()
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_upstream_timeout() -> u64 {
        30
    }

    /// Get the backend call timeout as a `Duration`.
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }

    /// Load the route list (from `routes_file` when set) and build the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a route is
    /// invalid, or a route targets a backend without a base URL.
    pub fn route_table(&self) -> Result<RouteTable> {
        let specs: Vec<RouteSpec> = match &self.routes_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| {
                    ConfigError::RoutesFile {
                        path: path.clone(),
                        source,
                    }
                })?;
                serde_json::from_str(&raw)?
            }
            None => default_routes(),
        };

        let table = RouteTable::from_specs(&specs)?;
        table.check_backends(&self.backends)?;
        Ok(table)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: Self::default_max_body(),
            upstream_timeout_seconds: Self::default_upstream_timeout(),
            routes_file: None,
            backends: Backends::default(),
        }
    }
}

/// Everything the gateway reads from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP and backend configuration.
    pub gateway: GatewayConfig,
    /// Shared token secret.
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SECRET"))?;

        let mut backends = Backends::default();
        for backend in BackendId::ALL {
            let var = backend.url_env_var();
            let url = lookup(var).ok_or(ConfigError::Missing(var))?;
            reqwest::Url::parse(&url).map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })?;
            backends = backends.with(backend, url);
        }

        let defaults = GatewayConfig::default();
        let gateway = GatewayConfig {
            listen_addr: lookup("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: parse_number(&lookup, "MAX_BODY_BYTES")?
                .unwrap_or(defaults.max_body_bytes),
            upstream_timeout_seconds: parse_number(&lookup, "UPSTREAM_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.upstream_timeout_seconds),
            routes_file: lookup("ROUTES_FILE").map(PathBuf::from),
            backends,
        };

        Ok(Self {
            gateway,
            auth: AuthConfig::new(secret),
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_number<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}
