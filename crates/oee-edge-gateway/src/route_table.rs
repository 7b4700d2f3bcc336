//! Static routing table.
//!
//! The table maps a public `(method, path)` to the backend call that serves
//! it. It is built once at startup from an ordered list of [`RouteSpec`]s and
//! never mutated; lookups scan it in declaration order and the first match
//! wins.
//!
//! Patterns are `/`-separated segments, each either a literal or a named
//! parameter (`:name`) that binds exactly one non-empty path segment.
//! Captured values are substituted into the backend path template by
//! position: the i-th template parameter receives the i-th capture,
//! whatever the names.

use std::fmt;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use oee_edge_core::{BackendId, CoreError};

use crate::config::Backends;

/// Message used when a route declares no fallback of its own.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "error accessing service";

/// Errors raised while building the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A path pattern or backend path template is malformed.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The HTTP method is not valid.
    #[error("invalid method: {0:?}")]
    InvalidMethod(String),

    /// A proxy route names no backend.
    #[error("route {0} has no backend")]
    MissingBackend(String),

    /// A backend path has more parameters than the public pattern binds.
    #[error("route {route} backend path needs {template} parameters, pattern binds {bound}")]
    ParameterCount {
        /// The route being built.
        route: String,
        /// Parameters in the backend path template.
        template: usize,
        /// Parameters bound by the public pattern.
        bound: usize,
    },

    /// The logout route must sit behind the auth gate.
    #[error("logout route {0} must require authentication")]
    LogoutRequiresAuth(String),

    /// A route targets a backend without a configured base URL.
    #[error(transparent)]
    Backend(#[from] CoreError),
}

// =============================================================================
// Path patterns
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern such as `/indicadores/oee/:maquina`.
///
/// The same type renders backend path templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::InvalidPattern` if the pattern does not start
    /// with `/`, contains an empty segment, or has an empty or duplicate
    /// parameter name.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('/') {
                let segment = match part.strip_prefix(':') {
                    Some("") => return Err(invalid("empty parameter name")),
                    Some(name) => {
                        if segments.contains(&Segment::Param(name.to_string())) {
                            return Err(invalid("duplicate parameter name"));
                        }
                        Segment::Param(name.to_string())
                    }
                    None if part.is_empty() => return Err(invalid("empty segment")),
                    None => Segment::Literal(part.to_string()),
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Names of the parameters, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete request path, binding parameters.
    ///
    /// Literals compare ASCII case-insensitively and a single trailing `/`
    /// on the path is ignored. Segment counts must be equal.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let path = path.strip_prefix('/')?;
        let path = path.strip_suffix('/').unwrap_or(path);

        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if !literal.eq_ignore_ascii_case(part) {
                        return None;
                    }
                }
                Segment::Param(_) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.0.push(part.to_string());
                }
            }
        }

        Some(params)
    }

    /// Render the pattern as a path, substituting captures by position.
    ///
    /// Parameter values are inserted exactly as they appeared in the
    /// inbound path.
    #[must_use]
    pub fn render(&self, params: &PathParams) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }

        let mut values = params.values();
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Param(_) => path.push_str(values.next().unwrap_or_default()),
            }
        }
        path
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Values captured by a successful match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<String>);

impl PathParams {
    /// Captured values, in pattern order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// =============================================================================
// Route configuration
// =============================================================================

/// How a matched route is served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteHandler {
    /// Forward to a backend service.
    #[default]
    Proxy,
    /// Served by the gateway's logout handler.
    Logout,
}

/// One entry of the route configuration list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    /// HTTP method (case-insensitive).
    pub method: String,
    /// Public path pattern.
    pub pattern: String,
    /// How the route is served.
    #[serde(default)]
    pub handler: RouteHandler,
    /// Target backend for proxy routes.
    #[serde(default)]
    pub backend: Option<BackendId>,
    /// Backend path template; defaults to `pattern`.
    #[serde(default)]
    pub backend_path: Option<String>,
    /// Whether the auth gate runs before the handler.
    #[serde(default = "RouteSpec::default_requires_auth")]
    pub requires_auth: bool,
    /// Whether the inbound `Authorization` header is sent to the backend.
    #[serde(default)]
    pub forward_authorization: bool,
    /// Message used when the backend fails without a usable body.
    #[serde(default)]
    pub fallback_message: Option<String>,
}

impl RouteSpec {
    const fn default_requires_auth() -> bool {
        true
    }

    /// An authenticated route forwarded to `backend` under the same path.
    #[must_use]
    pub fn proxy(method: &Method, pattern: &str, backend: BackendId) -> Self {
        Self {
            method: method.as_str().to_string(),
            pattern: pattern.to_string(),
            handler: RouteHandler::Proxy,
            backend: Some(backend),
            backend_path: None,
            requires_auth: true,
            forward_authorization: false,
            fallback_message: None,
        }
    }

    /// The authenticated logout route.
    #[must_use]
    pub fn logout(pattern: &str) -> Self {
        Self {
            method: Method::POST.as_str().to_string(),
            pattern: pattern.to_string(),
            handler: RouteHandler::Logout,
            backend: None,
            backend_path: None,
            requires_auth: true,
            forward_authorization: false,
            fallback_message: None,
        }
    }

    /// Skip the auth gate for this route.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Send the inbound `Authorization` header to the backend.
    #[must_use]
    pub fn with_authorization_forwarded(mut self) -> Self {
        self.forward_authorization = true;
        self
    }

    /// Use a different path on the backend.
    #[must_use]
    pub fn with_backend_path(mut self, backend_path: &str) -> Self {
        self.backend_path = Some(backend_path.to_string());
        self
    }

    /// Set the fallback error message.
    #[must_use]
    pub fn fallback(mut self, message: &str) -> Self {
        self.fallback_message = Some(message.to_string());
        self
    }
}

/// The backend call behind a proxy route.
#[derive(Debug, Clone)]
pub struct BackendTarget {
    /// Target backend.
    pub backend: BackendId,
    /// Backend path template.
    pub path: PathPattern,
    /// Whether the inbound `Authorization` header is forwarded.
    pub forward_authorization: bool,
}

/// What serves a matched route.
#[derive(Debug, Clone)]
pub enum RouteTarget {
    /// Forward to a backend.
    Backend(BackendTarget),
    /// Local logout handler.
    Logout,
}

/// A compiled, immutable route.
#[derive(Debug, Clone)]
pub struct Route {
    /// HTTP method, compared exactly.
    pub method: Method,
    /// Public path pattern.
    pub pattern: PathPattern,
    /// Whether the auth gate runs first.
    pub requires_auth: bool,
    /// Message used when the backend fails without a usable body.
    pub fallback_message: String,
    /// What serves the route.
    pub target: RouteTarget,
}

impl Route {
    /// Compile a route from its configuration entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the method or a pattern is invalid, a proxy route
    /// has no backend or uses an unbound parameter, or a logout route is
    /// public.
    pub fn from_spec(spec: &RouteSpec) -> Result<Self, RouteError> {
        let method = Method::from_bytes(spec.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| RouteError::InvalidMethod(spec.method.clone()))?;
        let pattern = PathPattern::parse(&spec.pattern)?;
        let name = format!("{method} {pattern}");

        let target = match spec.handler {
            RouteHandler::Logout => {
                if !spec.requires_auth {
                    return Err(RouteError::LogoutRequiresAuth(name));
                }
                RouteTarget::Logout
            }
            RouteHandler::Proxy => {
                let backend = spec
                    .backend
                    .ok_or_else(|| RouteError::MissingBackend(name.clone()))?;
                let template = spec.backend_path.as_deref().unwrap_or(&spec.pattern);
                let path = PathPattern::parse(template)?;

                let needed = path.param_names().count();
                let bound = pattern.param_names().count();
                if needed > bound {
                    return Err(RouteError::ParameterCount {
                        route: name,
                        template: needed,
                        bound,
                    });
                }

                RouteTarget::Backend(BackendTarget {
                    backend,
                    path,
                    forward_authorization: spec.forward_authorization,
                })
            }
        };

        Ok(Self {
            method,
            pattern,
            requires_auth: spec.requires_auth,
            fallback_message: spec
                .fallback_message
                .clone()
                .unwrap_or_else(|| DEFAULT_FALLBACK_MESSAGE.to_string()),
            target,
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

/// A route matched against a request, with its bound parameters.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The matched route.
    pub route: &'a Route,
    /// Parameters bound by the pattern.
    pub params: PathParams,
}

/// The ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile a table from configuration entries, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns the first route compilation error.
    pub fn from_specs(specs: &[RouteSpec]) -> Result<Self, RouteError> {
        let routes = specs
            .iter()
            .map(Route::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    /// Find the first route matching `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route
                    .pattern
                    .matches(path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    /// Ensure every proxy route targets a configured backend.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::Backend` for the first unconfigured backend.
    pub fn check_backends(&self, backends: &Backends) -> Result<(), RouteError> {
        for route in &self.routes {
            if let RouteTarget::Backend(target) = &route.target {
                backends.base_url(target.backend)?;
            }
        }
        Ok(())
    }

    /// Iterate over the routes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// The gateway's public API surface.
#[must_use]
pub fn default_routes() -> Vec<RouteSpec> {
    use BackendId::{Indicators, Mock, User};

    const INDICATORS: &str = "error accessing indicators";
    const MACHINE_OEE: &str = "error accessing machine OEE";
    const OPERATORS: &str = "error accessing operator indicators";

    let mut routes = vec![
        // Auth
        RouteSpec::proxy(&Method::POST, "/auth/login", User)
            .public()
            .fallback("login failed"),
        RouteSpec::proxy(&Method::POST, "/auth/register", User)
            .public()
            .fallback("registration failed"),
        RouteSpec::logout("/auth/logout"),
        // Users
        RouteSpec::proxy(&Method::GET, "/user/:id", User)
            .with_authorization_forwarded()
            .fallback("error accessing user"),
        // Indicators
        RouteSpec::proxy(&Method::GET, "/indicadores/oee", Indicators).fallback(INDICATORS),
        RouteSpec::proxy(&Method::GET, "/indicadores/oeegeral", Indicators).fallback(INDICATORS),
        RouteSpec::proxy(&Method::GET, "/indicadores/oeegeral/maquinas", Indicators)
            .fallback(INDICATORS),
        RouteSpec::proxy(&Method::GET, "/indicadores/separados/maquinas", Indicators)
            .fallback(INDICATORS),
        RouteSpec::proxy(&Method::GET, "/indicadores/oee/:maquina", Indicators)
            .fallback(MACHINE_OEE),
    ];

    for indicator in ["disponibilidade", "performance", "qualidade"] {
        let base = format!("/indicadores/{indicator}");
        routes.push(RouteSpec::proxy(&Method::GET, &base, Indicators).fallback(INDICATORS));
        routes.push(
            RouteSpec::proxy(&Method::GET, &format!("{base}/:maquina"), Indicators)
                .fallback(MACHINE_OEE),
        );
    }

    routes.extend([
        RouteSpec::proxy(&Method::GET, "/indicadores/operadores", Indicators).fallback(OPERATORS),
        RouteSpec::proxy(&Method::GET, "/indicadores/operadores/:operador", Indicators)
            .fallback(OPERATORS),
        // Mock data control
        RouteSpec::proxy(&Method::POST, "/start", Mock)
            .with_authorization_forwarded()
            .fallback("error starting mock data generator"),
        RouteSpec::proxy(&Method::POST, "/stop", Mock)
            .with_authorization_forwarded()
            .fallback("error stopping mock data generator"),
        RouteSpec::proxy(&Method::GET, "/status", Mock)
            .with_authorization_forwarded()
            .fallback("error reading mock data generator status"),
    ]);

    routes
}
