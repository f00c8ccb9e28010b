//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::repository::GatewayError;
use crate::service::pipeline_service::PipelineError;
use crate::service::task_service::TaskError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    PersistenceError(GatewayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PersistenceError(err) => {
                tracing::error!("Persistence error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PipelineError::ValidationError(msg) => ApiError::BadRequest(msg),
            PipelineError::PersistenceError(e) => ApiError::PersistenceError(e),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::PipelineNotFound(_) | TaskError::NotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            TaskError::ValidationError(msg) => ApiError::BadRequest(msg),
            TaskError::PersistenceError(e) => ApiError::PersistenceError(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
