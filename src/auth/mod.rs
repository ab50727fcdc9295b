pub mod credentials;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::not_blank;

pub use credentials::CredentialStore;
pub use extractors::{AdminPrincipal, Principal};
pub use middleware::AccessFilter;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

lazy_static! {
    // Letters, digits, dots, underscores and hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9._-]+$").unwrap();
}

/// Payload for `POST /api/auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom = "not_blank")]
    pub username: String,
    #[validate(custom = "not_blank")]
    pub password: String,
}

/// Payload for `POST /api/auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// 3 to 32 characters: letters, digits, dots, underscores or hyphens.
    #[validate(
        length(min = 3, max = 32, message = "must be between 3 and 32 characters"),
        regex(
            path = "USERNAME_REGEX",
            message = "may only contain letters, digits, dots, underscores or hyphens"
        )
    )]
    pub username: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[validate(
        custom = "not_blank",
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Returned by a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub user_id: i64,
}
