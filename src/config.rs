use std::env;

use chrono::{Duration, Utc};
use thiserror::Error;

use crate::auth::password::DEFAULT_COST;

/// Minimum HS256 key length in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

const DEFAULT_DATABASE_URL: &str = "sqlite://forumhub.db";
const DEFAULT_TOKEN_TTL_MS: i64 = 86_400_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("JWT_SECRET is too short: {0} bytes, at least 32 are required (e.g. `openssl rand -base64 32`)")]
    WeakSecret(usize),
}

/// Credentials for the administrator account created (or promoted) at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_expiration_ms: i64,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSecret(jwt_secret.len()));
        }

        let server_port = match lookup("SERVER_PORT") {
            Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "SERVER_PORT",
                reason: format!("{}", e),
            })?,
            None => 8080,
        };

        let jwt_expiration_ms = match lookup("JWT_EXPIRATION_MS") {
            Some(ms) => match ms.parse::<i64>() {
                Ok(ms) if ms > 0 && expiry_in_range(ms) => ms,
                Ok(ms) if ms > 0 => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_EXPIRATION_MS",
                        reason: format!("{} ms is too far in the future", ms),
                    })
                }
                Ok(ms) => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_EXPIRATION_MS",
                        reason: format!("must be positive, got {}", ms),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_EXPIRATION_MS",
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_TOKEN_TTL_MS,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(cost) => match cost.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                Ok(cost) => {
                    return Err(ConfigError::Invalid {
                        key: "BCRYPT_COST",
                        reason: format!("must be between 4 and 31, got {}", cost),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "BCRYPT_COST",
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_COST,
        };

        let admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed {
                email: lookup("ADMIN_EMAIL").unwrap_or_else(|| format!("{}@forumhub.local", username)),
                name: lookup("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                username,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_USERNAME")),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            jwt_expiration_ms,
            bcrypt_cost,
            admin,
        })
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::milliseconds(self.jwt_expiration_ms)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Whether a token issued now with this lifetime has a representable expiry.
fn expiry_in_range(ms: i64) -> bool {
    Utc::now()
        .checked_add_signed(Duration::milliseconds(ms))
        .is_some()
}
