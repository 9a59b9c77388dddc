//! Forwarding failures and their HTTP mapping.
//!
//! Errors travel as values through the engine and only become a status
//! code here, at the edge of a single forwarding operation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::net::TransportError;
use crate::security::limits::AdmissionClosed;

/// Why a forward did not produce an upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    /// The caller asked for a scheme other than http or https.
    #[error("Invalid scheme: {scheme}. Only http and https are supported.")]
    InvalidScheme { scheme: String },

    /// The path did not contain a usable `host:port` target.
    #[error("Invalid target: {reason}")]
    InvalidTarget { reason: String },

    /// Connecting to or talking with the upstream failed.
    #[error("Error forwarding request to target server: {0}")]
    Upstream(String),

    /// Anything else that went wrong inside the proxy.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ForwardError {
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        ForwardError::InvalidTarget {
            reason: reason.into(),
        }
    }

    /// Status code sent to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::InvalidScheme { .. } | ForwardError::InvalidTarget { .. } => {
                StatusCode::BAD_REQUEST
            }
            ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ForwardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TransportError> for ForwardError {
    fn from(err: TransportError) -> Self {
        if err.is_upstream() {
            ForwardError::Upstream(err.to_string())
        } else {
            ForwardError::Internal(err.to_string())
        }
    }
}

impl From<AdmissionClosed> for ForwardError {
    fn from(err: AdmissionClosed) -> Self {
        ForwardError::Internal(err.to_string())
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}
