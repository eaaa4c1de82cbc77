//! Centralized error handling module
//!
//! Provides the index engine's error type and the HTTP-facing application
//! error with its response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::models::Pollutant;

/// Errors raised by the index engine.
///
/// Both kinds are deterministic configuration or data errors; callers should
/// never retry them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A limit (default or override) is not a positive number
    #[error("Limit for {} must be positive, got {limit}", pollutant_name(.pollutant))]
    InvalidLimit {
        /// Offending pollutant, when the limit came from a limit set
        pollutant: Option<Pollutant>,
        limit: f64,
    },

    /// No pollutant carried a usable reading
    #[error("At least one valid pollutant measurement is required")]
    InsufficientData,
}

fn pollutant_name(pollutant: &Option<Pollutant>) -> &'static str {
    pollutant.map_or("pollutant", |p| p.key())
}

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Standardized error response format
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    /// Unique correlation ID for tracing
    pub correlation_id: String,
    /// Error type classification
    pub error_type: String,
    /// Human-readable error message (safe for clients)
    pub message: String,
    /// Pollutant the error refers to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub status_code: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str, status_code: StatusCode) -> Self {
        Self {
            success: false,
            correlation_id: Uuid::new_v4().to_string(),
            error_type: error_type.to_string(),
            message: message.to_string(),
            field: None,
            status_code: status_code.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_field(mut self, field: Option<String>) -> Self {
        self.field = field;
        self
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Index(IndexError::InvalidLimit { .. }) => "INVALID_LIMIT",
            AppError::Index(IndexError::InsufficientData) => "INSUFFICIENT_DATA",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::Index(err) => err.to_string(),
        };

        let field = match self {
            AppError::Index(IndexError::InvalidLimit {
                pollutant: Some(p), ..
            }) => Some(format!("limits.{}", p.key())),
            _ => None,
        };

        let error_response = ErrorResponse::new(error_type, &message, status).with_field(field);

        error!(
            correlation_id = %error_response.correlation_id,
            error_type = %error_type,
            status_code = %status.as_u16(),
            "Error response generated"
        );

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Index(IndexError::InvalidLimit { .. }) => StatusCode::BAD_REQUEST,
            AppError::Index(IndexError::InsufficientData) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
