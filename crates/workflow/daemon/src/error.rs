//! Error types for workflowd

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use workflow_types::WorkflowError;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Startup seeding failed
    #[error("Seed error: {0}")]
    Seed(#[from] WorkflowError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Engine rejected the operation
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Request could not be interpreted
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No acting user on the request
    #[error("Missing actor: {0}")]
    MissingActor(String),

    /// A deadline sweep is already running
    #[error("Deadline sweep already running")]
    SweepRunning,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Workflow(e) => match e {
                WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                WorkflowError::Forbidden(_) => StatusCode::FORBIDDEN,
                WorkflowError::InvalidStateTransition { .. }
                | WorkflowError::NotCurrentStep { .. }
                | WorkflowError::Conflict(_) => StatusCode::CONFLICT,
                WorkflowError::InvalidStep { .. }
                | WorkflowError::InvalidStatus(_)
                | WorkflowError::ValidationError(_)
                | WorkflowError::InvalidTemplate(_) => StatusCode::UNPROCESSABLE_ENTITY,
                WorkflowError::InconsistentState(_) | WorkflowError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingActor(_) => StatusCode::UNAUTHORIZED,
            ApiError::SweepRunning => StatusCode::CONFLICT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Workflow(e) => e.code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::MissingActor(_) => "MISSING_ACTOR",
            ApiError::SweepRunning => "SWEEP_RUNNING",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
