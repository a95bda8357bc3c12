//! Common error types for the edit-serving crate

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Provide 'image' (base64 string) or 'images' (list of base64 strings)")]
    MissingInput,

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("'prompt' is required")]
    MissingPrompt,

    #[error("Malformed parameter '{field}': {detail}")]
    MalformedParameter { field: &'static str, detail: String },

    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error taxonomy tag carried on every failed job response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingInput,
    MalformedInput,
    MissingPrompt,
    MalformedParameter,
    CodecError,
    EngineError,
    TransportError,
    TimeoutError,
    #[default]
    Internal,
}

impl AppError {
    /// Taxonomy tag for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::MissingInput => ErrorKind::MissingInput,
            AppError::MalformedInput(_) => ErrorKind::MalformedInput,
            AppError::MissingPrompt => ErrorKind::MissingPrompt,
            AppError::MalformedParameter { .. } => ErrorKind::MalformedParameter,
            AppError::InvalidEncoding(_) => ErrorKind::CodecError,
            AppError::Engine(_) => ErrorKind::EngineError,
            AppError::Transport(_) => ErrorKind::TransportError,
            AppError::Timeout(_) => ErrorKind::TimeoutError,
            AppError::JobNotFound(_)
            | AppError::Config(_)
            | AppError::Json(_)
            | AppError::Io(_)
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Terminal error payload of a failed job: one human-readable message plus a
/// taxonomy tag. Constructed by the job handler, read-only downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "error")]
    pub message: String,
    #[serde(default)]
    pub kind: ErrorKind,
}

impl From<AppError> for ErrorEnvelope {
    fn from(err: AppError) -> Self {
        Self {
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::JobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingInput
            | AppError::MalformedInput(_)
            | AppError::MissingPrompt
            | AppError::MalformedParameter { .. }
            | AppError::InvalidEncoding(_)
            | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Engine(_) | AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorEnvelope::from(self));
        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
