//! Type-safe error codes for API responses.
//!
//! Each code carries:
//! - a string identifier for clients (e.g., "LOGIN_ALREADY_USED")
//! - an integer code for logs and metrics (e.g., 1101)
//! - a default human-readable message
//! - the HTTP status it is served with
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::LoginAlreadyUsed;
//! assert_eq!(code.as_str(), "LOGIN_ALREADY_USED");
//! assert_eq!(code.code(), 1101);
//! assert_eq!(code.default_message(), "Login name already used");
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1099)
    /// Request validation failed
    ValidationError,

    /// Malformed or disallowed `sort` parameter
    InvalidSort,

    /// JSON extraction from request body failed
    JsonExtraction,

    /// Requested resource was not found
    NotFound,

    /// Authentication credentials are missing or invalid
    Unauthorized,

    /// Authenticated user lacks sufficient permissions
    Forbidden,

    /// Request conflicts with current resource state
    Conflict,

    /// Query string could not be parsed
    InvalidQuery,

    /// Generic malformed request
    BadRequest,

    // Account errors (1100-1199)
    /// Another account already owns the login
    LoginAlreadyUsed,

    /// Another account already owns the email address
    EmailAlreadyUsed,

    /// Login/password pair did not match an activated account
    InvalidCredentials,

    /// No account is waiting for this activation key
    InvalidActivationKey,

    // Server errors
    /// An unexpected internal server error occurred
    InternalError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    // Storage errors (2000-2099)
    /// Backing store rejected or failed the operation
    DatabaseError,

    // Serialization errors (5000s)
    /// JSON serialization/deserialization error
    SerdeJsonError,
}

impl ErrorCode {
    /// SCREAMING_SNAKE_CASE identifier clients can match on
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidSort => "INVALID_SORT",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::BadRequest => "BAD_REQUEST",
            Self::LoginAlreadyUsed => "LOGIN_ALREADY_USED",
            Self::EmailAlreadyUsed => "EMAIL_ALREADY_USED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidActivationKey => "INVALID_ACTIVATION_KEY",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Integer code for structured logs and metrics.
    ///
    /// Ranges:
    /// - 1000-1099: client errors
    /// - 1100-1199: account errors
    /// - 2000-2099: storage errors
    /// - 5000-5999: serialization errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidSort => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::Conflict => 1008,
            Self::InvalidQuery => 1009,
            Self::BadRequest => 1010,
            Self::ServiceUnavailable => 1011,

            Self::LoginAlreadyUsed => 1101,
            Self::EmailAlreadyUsed => 1102,
            Self::InvalidCredentials => 1103,
            Self::InvalidActivationKey => 1104,

            Self::DatabaseError => 2001,

            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidSort => "Invalid sort parameter",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "Access forbidden",
            Self::Conflict => "Resource already exists",
            Self::InvalidQuery => "Invalid query string",
            Self::BadRequest => "Bad request",
            Self::LoginAlreadyUsed => "Login name already used",
            Self::EmailAlreadyUsed => "Email is already in use",
            Self::InvalidCredentials => "Invalid login or password",
            Self::InvalidActivationKey => "No user was found for this activation key",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::DatabaseError => "Database error occurred",
            Self::SerdeJsonError => "JSON serialization error",
        }
    }

    /// HTTP status the code is served with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError
            | Self::InvalidSort
            | Self::JsonExtraction
            | Self::InvalidQuery
            | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::InvalidActivationKey => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict | Self::LoginAlreadyUsed | Self::EmailAlreadyUsed => {
                StatusCode::CONFLICT
            }
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError | Self::DatabaseError | Self::SerdeJsonError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
