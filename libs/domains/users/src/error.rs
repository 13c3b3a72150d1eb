use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(String),

    #[error("Login name already used")]
    LoginAlreadyUsed,

    #[error("Email is already in use")]
    EmailAlreadyUsed,

    #[error("{0}")]
    InvalidSort(String),

    #[error("Authority {0} not found")]
    AuthorityNotFound(String),

    #[error("Authority {0} already exists")]
    AuthorityAlreadyExists(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("No user was found for this activation key")]
    InvalidActivationKey,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// Login/email uniqueness violations
    pub fn is_conflict(&self) -> bool {
        matches!(self, UserError::LoginAlreadyUsed | UserError::EmailAlreadyUsed)
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::AuthorityNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            UserError::LoginAlreadyUsed => AppError::coded(ErrorCode::LoginAlreadyUsed),
            UserError::EmailAlreadyUsed => AppError::coded(ErrorCode::EmailAlreadyUsed),
            UserError::AuthorityAlreadyExists(_) => AppError::Conflict(err.to_string()),
            UserError::InvalidSort(message) => AppError::Coded {
                code: ErrorCode::InvalidSort,
                message,
            },
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::InvalidCredentials => AppError::coded(ErrorCode::InvalidCredentials),
            UserError::InvalidActivationKey => AppError::coded(ErrorCode::InvalidActivationKey),
            UserError::Database(msg) => AppError::Database(msg),
            UserError::PasswordHash(msg) | UserError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        UserError::Database(err.to_string())
    }
}
