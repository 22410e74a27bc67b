//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map registry ask failures to HTTP status codes
//! - Render errors as JSON bodies
//!
//! # Design Decisions
//! - Ask timeouts result in 504 Gateway Timeout
//! - A stopped registry results in 503 Service Unavailable
//! - Unknown groups and devices are 404, never created by a read

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::actor::AskError;

/// Errors returned by the HTTP facade.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("device not found: {group}/{device}")]
    DeviceNotFound { group: String, device: String },

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Registry(#[from] AskError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::GroupNotFound(_) | ApiError::DeviceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Registry(AskError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Registry(AskError::Closed) | ApiError::Registry(AskError::NoReply) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "Registry request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
