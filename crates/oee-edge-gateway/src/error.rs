//! API error types and responses.
//!
//! Every failure the gateway reports is rendered as `{"message": ...}`,
//! with an extra `details` field for transport failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use oee_edge_auth::AuthError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token was presented.
    #[error("access denied: no token provided")]
    MissingToken,

    /// The token is malformed or its signature does not verify.
    #[error("invalid token")]
    InvalidToken,

    /// The token is past its expiry.
    #[error("token expired")]
    ExpiredToken,

    /// No route matches the request.
    #[error("route not found")]
    NoRouteMatch,

    /// The request body exceeds the configured limit.
    #[error("request body too large")]
    PayloadTooLarge,

    /// The backend could not be reached.
    #[error("{message}")]
    BackendUnreachable {
        /// Route-specific client message.
        message: String,
        /// Human-readable transport failure.
        details: String,
    },

    /// The backend failed without a structured body.
    #[error("{message}")]
    BackendError {
        /// Route-specific client message.
        message: String,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::ExpiredToken => StatusCode::FORBIDDEN,
            Self::NoRouteMatch => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BackendUnreachable { .. } | Self::BackendError { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            Self::BackendUnreachable { message, details } => ErrorResponse {
                message,
                details: Some(details),
            },
            // Internal details stay in the logs.
            Self::Internal(_) => ErrorResponse {
                message: "internal server error".to_string(),
                details: None,
            },
            other => ErrorResponse {
                message: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => Self::MissingToken,
            AuthError::ExpiredToken => Self::ExpiredToken,
            AuthError::MalformedToken(_) | AuthError::InvalidSignature => Self::InvalidToken,
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Auth internal error");
                Self::Internal(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::MissingToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::ExpiredToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NoRouteMatch.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::BackendError {
                message: "x".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthError::MissingToken),
            ApiError::MissingToken
        ));
        assert!(matches!(
            ApiError::from(AuthError::ExpiredToken),
            ApiError::ExpiredToken
        ));
        assert!(matches!(
            ApiError::from(AuthError::InvalidSignature),
            ApiError::InvalidToken
        ));
        assert!(matches!(
            ApiError::from(AuthError::MalformedToken("x".into())),
            ApiError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn message_body() {
        let (status, body) = body_json(ApiError::ExpiredToken).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "token expired" }));

        let (_, body) = body_json(ApiError::InvalidToken).await;
        assert_eq!(body, json!({ "message": "invalid token" }));
    }

    #[tokio::test]
    async fn unreachable_body_has_details() {
        let (status, body) = body_json(ApiError::BackendUnreachable {
            message: "error accessing indicators".into(),
            details: "could not reach indicators service: refused".into(),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "message": "error accessing indicators",
                "details": "could not reach indicators service: refused"
            })
        );
    }

    #[tokio::test]
    async fn internal_body_is_generic() {
        let (_, body) = body_json(ApiError::Internal("secret detail".into())).await;
        assert_eq!(body, json!({ "message": "internal server error" }));
    }
}
