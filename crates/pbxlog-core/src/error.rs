//! Unified error handling for pbxlog
//!
//! This module provides one error type for the ingestion pipeline and the read
//! path, with automatic HTTP response mapping for the latter.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Schema setup failed: {0}")]
    Schema(String),

    #[error("Persistence failed after {attempts} attempts: {last_error}")]
    PersistenceExhausted { attempts: u32, last_error: String },

    // ==================== PABX Errors ====================
    #[error("PABX connection error: {0}")]
    PabxConnection(String),

    #[error("PABX closed the connection")]
    PabxDisconnected,

    #[error("Framing error: {0}")]
    Framing(String),

    // ==================== Validation Errors ====================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,

            // 503 Service Unavailable
            AppError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Schema(_) => "schema_error",
            AppError::PersistenceExhausted { .. } => "persistence_exhausted",
            AppError::PabxConnection(_) => "pabx_connection_error",
            AppError::PabxDisconnected => "pabx_disconnected",
            AppError::Framing(_) => "framing_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Io(_) => "io_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether this error ends the ingestion process
    pub fn is_fatal_for_ingestion(&self) -> bool {
        matches!(
            self,
            AppError::PabxConnection(_)
                | AppError::PabxDisconnected
                | AppError::Framing(_)
                | AppError::PersistenceExhausted { .. }
                | AppError::Schema(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
