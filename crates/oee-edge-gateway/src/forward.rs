//! Backend request forwarding.
//!
//! The forwarder turns a matched route and the inbound request into one
//! backend call, then maps the tagged [`UpstreamOutcome`] into the gateway
//! response. There is no retry and no fallback backend: one failed attempt
//! is one reported failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use oee_edge_core::BackendId;

use crate::config::Backends;
use crate::error::ApiError;
use crate::route_table::{BackendTarget, PathParams, Route};

/// A single backend call.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// Backend being called, for logging.
    pub backend: BackendId,
    /// HTTP method, same as the inbound request.
    pub method: Method,
    /// Absolute backend URL.
    pub url: String,
    /// `Authorization` header copied from the inbound request.
    pub authorization: Option<HeaderValue>,
    /// Content type of `body`.
    pub content_type: Option<HeaderValue>,
    /// Request body, passed through unmodified.
    pub body: Option<Bytes>,
}

/// The result of a backend call.
#[derive(Debug, Clone)]
pub enum UpstreamOutcome {
    /// The backend answered with a non-error status.
    Success {
        /// Backend status code.
        status: StatusCode,
        /// Backend `Content-Type`, if any.
        content_type: Option<HeaderValue>,
        /// Backend body bytes.
        body: Bytes,
    },
    /// The backend answered with a 4xx or 5xx status.
    BackendError {
        /// Backend status code.
        status: StatusCode,
        /// Backend `Content-Type`, if any.
        content_type: Option<HeaderValue>,
        /// Backend body bytes (possibly empty).
        body: Bytes,
    },
    /// The backend could not be reached or the exchange broke off.
    Transport(String),
}

impl UpstreamOutcome {
    /// Classify a backend response by status.
    #[must_use]
    pub fn from_response(
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Self {
        if status.is_client_error() || status.is_server_error() {
            Self::BackendError {
                status,
                content_type,
                body,
            }
        } else {
            Self::Success {
                status,
                content_type,
                body,
            }
        }
    }
}

/// Trait for issuing backend calls.
///
/// This abstracts the HTTP client so tests can substitute their own.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Issue one backend call. Never retries.
    async fn send(&self, request: UpstreamRequest) -> UpstreamOutcome;
}

/// `reqwest`-based backend client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Create a client with the given per-call timeout.
    ///
    /// Redirects are not followed; a backend 3xx is relayed as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> UpstreamOutcome {
        let mut builder = self.client.request(request.method, &request.url);

        if let Some(authorization) = request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = request.body {
            let content_type = request
                .content_type
                .unwrap_or_else(|| HeaderValue::from_static("application/json"));
            builder = builder.header(CONTENT_TYPE, content_type).body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return UpstreamOutcome::Transport(error_chain(&e)),
        };

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();

        match response.bytes().await {
            Ok(body) => UpstreamOutcome::from_response(status, content_type, body),
            Err(e) => UpstreamOutcome::Transport(error_chain(&e)),
        }
    }
}

/// Render an error and its sources as one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// The parts of the inbound request the forwarder needs.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Inbound method.
    pub method: Method,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Inbound headers.
    pub headers: HeaderMap,
    /// Inbound body.
    pub body: Bytes,
}

impl InboundRequest {
    fn carries_body(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        ) && !self.body.is_empty()
    }
}

/// Builds backend calls for matched routes and maps their outcomes.
pub struct Forwarder<U>
where
    U: UpstreamClient,
{
    upstream: Arc<U>,
    backends: Backends,
}

impl<U> Forwarder<U>
where
    U: UpstreamClient,
{
    /// Create a forwarder over the given client and backend registry.
    #[must_use]
    pub fn new(upstream: Arc<U>, backends: Backends) -> Self {
        Self { upstream, backends }
    }

    /// Build the backend request for a matched route.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if the target backend has no base URL.
    pub fn build_request(
        &self,
        target: &BackendTarget,
        params: &PathParams,
        inbound: InboundRequest,
    ) -> Result<UpstreamRequest, ApiError> {
        let base_url = self.backends.base_url(target.backend).map_err(|e| {
            tracing::error!(error = %e, "Route targets an unconfigured backend");
            ApiError::Internal(e.to_string())
        })?;

        let mut url = format!("{base_url}{}", target.path.render(params));
        if let Some(query) = inbound.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        let authorization = if target.forward_authorization {
            inbound.headers.get(AUTHORIZATION).cloned()
        } else {
            None
        };

        let (content_type, body) = if inbound.carries_body() {
            (inbound.headers.get(CONTENT_TYPE).cloned(), Some(inbound.body))
        } else {
            (None, None)
        };

        Ok(UpstreamRequest {
            backend: target.backend,
            method: inbound.method,
            url,
            authorization,
            content_type,
            body,
        })
    }

    /// Forward the inbound request along `route` and map the outcome.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnreachable` on transport failure and `BackendError`
    /// when the backend fails without a JSON body.
    pub async fn forward(
        &self,
        route: &Route,
        target: &BackendTarget,
        params: &PathParams,
        inbound: InboundRequest,
    ) -> Result<Response, ApiError> {
        let request = self.build_request(target, params, inbound)?;
        let backend = request.backend;

        tracing::debug!(
            route = %route,
            backend = %backend,
            method = %request.method,
            url = %request.url,
            forward_authorization = request.authorization.is_some(),
            "Forwarding request"
        );

        let outcome = self.upstream.send(request).await;
        relay(outcome, backend, &route.fallback_message)
    }
}

/// Map a backend outcome into the gateway response.
///
/// # Errors
///
/// Returns `BackendUnreachable` on transport failure and `BackendError`
/// when the backend fails without a JSON body.
pub fn relay(
    outcome: UpstreamOutcome,
    backend: BackendId,
    fallback_message: &str,
) -> Result<Response, ApiError> {
    match outcome {
        UpstreamOutcome::Success {
            status,
            content_type,
            body,
        } => Ok(pass_through(status, content_type, body)),
        UpstreamOutcome::BackendError {
            status,
            content_type,
            body,
        } => {
            if is_json(&body) {
                tracing::debug!(backend = %backend, status = %status, "Relaying backend error");
                Ok(pass_through(status, content_type, body))
            } else {
                tracing::warn!(
                    backend = %backend,
                    status = %status,
                    "Backend error without a structured body"
                );
                Err(ApiError::BackendError {
                    message: fallback_message.to_string(),
                })
            }
        }
        UpstreamOutcome::Transport(detail) => {
            tracing::warn!(backend = %backend, error = %detail, "Backend unreachable");
            Err(ApiError::BackendUnreachable {
                message: fallback_message.to_string(),
                details: format!("could not reach {backend} service: {detail}"),
            })
        }
    }
}

fn is_json(body: &Bytes) -> bool {
    !body.is_empty() && serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok()
}

fn pass_through(status: StatusCode, content_type: Option<HeaderValue>, body: Bytes) -> Response {
    match content_type {
        Some(content_type) => {
            (status, [(CONTENT_TYPE, content_type)], Body::from(body)).into_response()
        }
        None => (status, Body::from(body)).into_response(),
    }
}
