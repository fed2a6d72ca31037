//! Error handling

use axum::{
    extract::rejection::FormRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Body returned when the classifier or scaler is missing
pub const MODEL_NOT_LOADED: &str = "Error: Model not loaded";

/// Malformed, missing or non-numeric form field, or a zero denominator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid field '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, "field is required")
    }
}

/// Classifier or scaler failed to load at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelUnavailableError {
    #[error("classifier is not loaded")]
    Classifier,
    #[error("scaler is not loaded")]
    Scaler,
}

/// Background audit write failure. Logged only.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("audit queue is full, record dropped")]
    QueueFull,
    #[error("audit queue is closed")]
    QueueClosed,
}

/// Model registry client failure
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Network(String),
    #[error("registry returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("registry response could not be parsed: {0}")]
    Parse(String),
    #[error("no registered model found for {0}")]
    ModelNotFound(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RegistryError::Parse(err.to_string())
        } else {
            RegistryError::Network(err.to_string())
        }
    }
}

/// Downloaded model artifact is unusable
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{artifact} expects {expected} values, got {actual}")]
    Shape {
        artifact: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{0}")]
    InvalidParameter(String),
    #[error("feature layout mismatch: {0}")]
    LayoutMismatch(String),
}

/// Fetching or decoding a model artifact at startup
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug)]
pub enum AppError {
    // Request errors
    Validation(ValidationError),
    BadRequest(String),

    // Degraded mode
    ModelUnavailable(ModelUnavailableError),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(err) => {
                tracing::debug!(field = %err.field, "Rejected application: {}", err.reason);
                error_body(StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            AppError::ModelUnavailable(err) => {
                tracing::warn!("Prediction refused: {}", err);
                let body = Json(json!({ "prediction": MODEL_NOT_LOADED }));
                (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ModelUnavailableError> for AppError {
    fn from(err: ModelUnavailableError) -> Self {
        AppError::ModelUnavailable(err)
    }
}

impl From<FormRejection> for AppError {
    fn from(err: FormRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
