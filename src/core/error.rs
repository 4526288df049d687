//! Unified error handling for the retrieval API
//!
//! Every failure in the request pipeline is one of these kinds. The core never
//! recovers from them locally; the HTTP boundary maps each kind to a status code.

use std::fmt;

use http::StatusCode;
use serde::Serialize;

/// Error kinds surfaced by the retrieval pipeline
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or unexpected request parameters
    Validation { field: String, message: String },

    /// No entity matches the requested id
    NotFound(String),

    /// The retriever refused a relation or field name
    Forbidden(String),

    /// Configuration-related errors
    Configuration(String),

    /// Response body could not be serialized
    Serialization(serde_json::Error),

    /// Internal system errors
    Internal(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "invalid_data",
            ApiError::NotFound(_) => "not_found",
            ApiError::Forbidden(_) => "not_allowed",
            ApiError::Configuration(_) => "configuration",
            ApiError::Serialization(_) => "serialization",
            ApiError::Internal(_) => "internal",
        }
    }

    /// Status code used when this error reaches the HTTP boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::Forbidden(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Configuration(_) | ApiError::Serialization(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_payload(&self) -> ErrorPayload<'_> {
        let field = match self {
            ApiError::Validation { field, .. } => Some(field.as_str()),
            _ => None,
        };
        ErrorPayload {
            error: self.kind(),
            message: self.to_string(),
            field,
        }
    }
}

/// JSON body written for a failed request.
#[derive(Debug, Serialize)]
pub struct ErrorPayload<'a> {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'a str>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation { field, message } => {
                write!(f, "Invalid parameter '{field}': {message}")
            }
            ApiError::NotFound(msg) => write!(f, "Resource not found: {msg}"),
            ApiError::Forbidden(msg) => write!(f, "Not allowed: {msg}"),
            ApiError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            ApiError::Serialization(err) => write!(f, "Serialization error: {err}"),
            ApiError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err)
    }
}

/// Result type alias for retrieval operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::ApiError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ApiError::Configuration(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! not_found {
    ($msg:expr) => {
        $crate::core::error::ApiError::NotFound($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ApiError::NotFound(format!($fmt, $($arg)*))
    };
}
