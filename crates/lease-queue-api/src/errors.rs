//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lease_queue_core::{ErrorKind, QueueError};
use tracing::{error, warn};

use crate::responses::ErrorResponse;

/// Request handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: malformed request or invalid argument
/// - `404 Not Found`: unknown message identifier
/// - `409 Conflict`: acknowledgement of a message that is not leased
/// - `500 Internal Server Error`: storage faults and other unexpected failures
///
/// Messages for server-side failures are sanitised; the detail is logged.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be interpreted
    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    /// The queue rejected the operation
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// HTTP status and stable error kind for this error
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Queue(e) => {
                let kind = e.kind();
                let status = match kind {
                    ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::LeaseExpiredOrInvalid => StatusCode::CONFLICT,
                    ErrorKind::StorageFault | ErrorKind::Configuration => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, kind.as_str())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = if status.is_server_error() {
            error!(error = %self, kind, "Internal server error occurred");
            "Internal server error occurred. Please try again later.".to_string()
        } else {
            warn!(error = %self, kind, "Request rejected");
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                kind: kind.to_string(),
            }),
        )
            .into_response()
    }
}
