//! Password hashing and verification over bcrypt

use thiserror::Error;

/// Password hashing errors
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hashing failed: {0}")]
    HashFailed(String),

    #[error("Verification failed: {0}")]
    VerifyFailed(String),
}

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| PasswordError::HashFailed(e.to_string()))
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::VerifyFailed(e.to_string()))
}
