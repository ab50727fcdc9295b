//! Signing and verification of bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, MIN_SECRET_BYTES};
use crate::error::AppError;

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the holder.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 tokens with a fixed lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Fails when the secret is shorter than 256 bits.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSecret(secret.len()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {}", e)))
    }

    /// The subject of a verified token.
    pub fn subject(&self, token: &str) -> Result<String, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims.sub)
    }

    pub fn validate(&self, token: &str) -> bool {
        self.subject(token).is_ok()
    }

    /// True only for a verified, unexpired token issued to `username`.
    pub fn validate_for(&self, token: &str, username: &str) -> bool {
        matches!(self.subject(token), Ok(subject) if subject == username)
    }
}
