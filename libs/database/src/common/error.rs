/// Error type shared by the database connectors
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// MongoDB driver errors
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Connection failed after retries
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Health check failed
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(feature = "config")]
impl From<core_config::ConfigError> for DatabaseError {
    fn from(err: core_config::ConfigError) -> Self {
        DatabaseError::ConfigError(err.to_string())
    }
}
