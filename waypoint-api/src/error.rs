use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use waypoint_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Endpoint not found")]
    RouteNotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(CoreError::InvalidInput(_)) | AppError::Core(CoreError::MissingParameter(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Core(CoreError::NotFound(_)) | AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::Core(CoreError::UpstreamUnavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Core(CoreError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", self);
            json!({
                "error": "Service temporarily unavailable",
                "details": self.to_string(),
            })
        } else {
            json!({ "error": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}
