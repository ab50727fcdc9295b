use bcrypt::{hash, verify};

use crate::error::AppError;

/// Work factor used outside of tests.
pub const DEFAULT_COST: u32 = 12;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    Ok(verify(password, password_hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let hashed = hash_password("correct horse", 4).unwrap();

        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed).unwrap());
        assert!(!verify_password("battery staple", &hashed).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_internal_error() {
        match verify_password("correct horse", "not-a-bcrypt-hash") {
            Err(AppError::InternalServerError(_)) => {}
            other => panic!("expected an internal error, got {:?}", other),
        }
    }
}
