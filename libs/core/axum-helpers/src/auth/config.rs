use core_config::{ConfigError, FromEnv, env_parse_or, env_required};

const MIN_SECRET_LEN: usize = 32;

/// Default token lifetime: one day
pub const DEFAULT_TOKEN_VALIDITY_SECS: i64 = 86_400;

/// JWT signing configuration.
///
/// Environment variables:
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_TOKEN_VALIDITY_SECS` (default: 86400)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub token_validity_secs: i64,
}

impl JwtConfig {
    /// # Panics
    /// Panics if the secret is shorter than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= MIN_SECRET_LEN,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            token_validity_secs: DEFAULT_TOKEN_VALIDITY_SECS,
        }
    }

    pub fn with_token_validity(mut self, secs: i64) -> Self {
        self.token_validity_secs = secs;
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ParseError {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least 32 characters (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        let token_validity_secs =
            env_parse_or("JWT_TOKEN_VALIDITY_SECS", DEFAULT_TOKEN_VALIDITY_SECS)?;

        Ok(Self {
            secret,
            token_validity_secs,
        })
    }
}
