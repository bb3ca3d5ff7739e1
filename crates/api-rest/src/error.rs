use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use consent_core::ConsentError;
use serde::Serialize;
use utoipa::ToSchema;

/// JSON error body: `{"error": "..."}`.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Handler error carrying the HTTP status to answer with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ConsentError> for ApiError {
    fn from(err: ConsentError) -> Self {
        let status = match &err {
            ConsentError::DirectoryUnavailable(_) | ConsentError::MalformedProvision(_) => {
                StatusCode::BAD_GATEWAY
            }
            ConsentError::MissingCheckPolicy { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorRes {
                error: self.message,
            }),
        )
            .into_response()
    }
}
