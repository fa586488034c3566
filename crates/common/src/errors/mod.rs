//! Error types for OfficeHub clients
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - Mapping from remote HTTP statuses to typed errors
//! - Structured error bodies as sent by the record service
//! - Error codes for host handling

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingField,

    // Authentication errors (2xxx)
    Unauthorized,
    NotAuthenticated,

    // Authorization errors (3xxx)
    Forbidden,

    // Resource errors (4xxx)
    NotFound,

    // Conflict errors (5xxx)
    Conflict,

    // External service errors (8xxx)
    UpstreamError,
    TransportError,
    DecodeError,

    // Internal errors (9xxx)
    StorageError,
    ConfigurationError,
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,

            ErrorCode::Unauthorized => 2001,
            ErrorCode::NotAuthenticated => 2002,

            ErrorCode::Forbidden => 3001,

            ErrorCode::NotFound => 4001,

            ErrorCode::Conflict => 5001,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::TransportError => 8002,
            ErrorCode::DecodeError => 8003,

            ErrorCode::StorageError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::InternalError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    // Authentication errors
    /// Rejected by the service; `message` is the service's own wording.
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Not signed in")]
    NotAuthenticated,

    // Authorization errors
    #[error("{message}")]
    Forbidden { message: String },

    // Resource errors
    #[error("{message}")]
    NotFound { message: String },

    // Conflict errors
    #[error("{message}")]
    Conflict { message: String },

    // External service errors
    #[error("Record service error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A response arrived but did not match its schema.
    #[error("Failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    // Internal errors
    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::NotAuthenticated => ErrorCode::NotAuthenticated,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::HttpClient(_) => ErrorCode::TransportError,
            AppError::Decode { .. } => ErrorCode::DecodeError,
            AppError::Storage { .. } => ErrorCode::StorageError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Build an error from a non-success response status and the service's message
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation {
                message,
                field: None,
            },
            StatusCode::UNAUTHORIZED => AppError::Unauthorized { message },
            StatusCode::FORBIDDEN => AppError::Forbidden { message },
            StatusCode::NOT_FOUND => AppError::NotFound { message },
            StatusCode::CONFLICT => AppError::Conflict { message },
            other => AppError::Upstream {
                status: other.as_u16(),
                message,
            },
        }
    }

    /// Build a decode error for the named response type
    pub fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::Decode {
            what,
            message: err.to_string(),
        }
    }

    /// True when the failure happened before or outside the service's decision
    /// (network, timeouts, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::HttpClient(_) => true,
            AppError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// True when the service rejected the caller's identity or permissions
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized { .. } | AppError::NotAuthenticated | AppError::Forbidden { .. }
        )
    }
}

/// Error body returned by the record service on non-success responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

/// The service sends either a plain message or a list of field errors
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl ErrorResponse {
    /// Extract the human-readable message from a raw error body.
    ///
    /// Falls back to the raw body text, then to the status reason.
    pub fn message_from_body(status: StatusCode, body: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(ErrorResponse {
                detail: ErrorDetail::Message(message),
            }) => message,
            Ok(ErrorResponse {
                detail: ErrorDetail::Fields(fields),
            }) => fields
                .into_iter()
                .map(|f| f.msg)
                .collect::<Vec<_>>()
                .join("; "),
            Err(_) if !body.trim().is_empty() => body.trim().to_string(),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|k| k.to_string());
        AppError::Validation {
            message: err.to_string(),
            field,
        }
    }
}
