use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims carried by access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Login of the authenticated user
    pub sub: String,
    /// Granted authority names, e.g. `ROLE_ADMIN`
    pub auth: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl JwtClaims {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.auth.iter().any(|a| a.as_str() == authority)
    }
}

/// HS256 token issuer and verifier
#[derive(Clone)]
pub struct JwtAuth {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    token_validity_secs: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(
            token_validity_secs = config.token_validity_secs,
            "JWT auth initialized"
        );
        Self {
            encoding: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            token_validity_secs: config.token_validity_secs,
        }
    }

    /// Sign a token for `login` holding `authorities`
    pub fn create_token(&self, login: &str, authorities: &[String]) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: login.to_string(),
            auth: authorities.to_vec(),
            exp: (now + Duration::seconds(self.token_validity_secs)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Check signature and expiry, returning the claims
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let data = decode::<JwtClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }

    pub fn token_validity_secs(&self) -> i64 {
        self.token_validity_secs
    }
}
