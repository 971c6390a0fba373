/// Password Hashing and Verification
///
/// Passwords are first reduced to a fixed 32-byte SHA-256 digest, then hashed
/// with Argon2id under a random salt. The stored string is the PHC encoding,
/// which carries the algorithm parameters and salt alongside the hash.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Fixed-length input for the password hash, whatever the password length
fn normalize_password(password: &str) -> Vec<u8> {
    Sha256::digest(password.as_bytes()).to_vec()
}

/// Hash a password with Argon2id
///
/// # Errors
/// Returns error if Argon2 rejects its parameters (not expected with defaults)
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(&normalize_password(password), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash
///
/// Mismatches and unparseable hashes both yield `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(&normalize_password(password), &parsed)
        .is_ok()
}
