/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 random bytes from the OS CSPRNG, URL-safe base64 without padding
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - Single-use: redemption deletes the record atomically, so a value
///   presented twice fails the second time

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AuthError, DatabaseError};
use crate::models::RefreshTokenRecord;
use crate::store::RefreshTokenRepository;

const TOKEN_BYTES: usize = 32;

/// Why a refresh token could not be redeemed
#[derive(Debug, Clone, PartialEq)]
pub enum RedeemError {
    NotFound,
    Expired,
    Storage(DatabaseError),
}

impl fmt::Display for RedeemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedeemError::NotFound => write!(f, "refresh token not found"),
            RedeemError::Expired => write!(f, "refresh token expired"),
            RedeemError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RedeemError {}

impl From<DatabaseError> for RedeemError {
    fn from(err: DatabaseError) -> Self {
        RedeemError::Storage(err)
    }
}

impl From<RedeemError> for AppError {
    fn from(err: RedeemError) -> Self {
        match err {
            RedeemError::NotFound => AppError::Auth(AuthError::InvalidRefreshToken),
            RedeemError::Expired => AppError::Auth(AuthError::RefreshExpired),
            RedeemError::Storage(e) => AppError::Database(e),
        }
    }
}

/// Generate a new cryptographically secure refresh token value
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a refresh token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issues and redeems single-use refresh tokens
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
    ttl: Duration,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>, ttl_seconds: i64) -> Self {
        Self {
            repository,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Mint a token for `user_id` and persist its hash
    ///
    /// # Errors
    /// Returns error if the database write fails
    pub async fn issue(&self, user_id: Uuid) -> Result<String, DatabaseError> {
        let token = generate_refresh_token();
        let record = RefreshTokenRecord {
            user_id,
            token_hash: hash_token(&token),
            expires_at: Utc::now() + self.ttl,
        };

        self.repository.insert(&record).await?;
        Ok(token)
    }

    /// Consume a token and return its owner
    ///
    /// The record is gone after this returns `Ok` or `Expired`; a second
    /// presentation of the same value is always `NotFound`.
    pub async fn redeem(&self, token: &str) -> Result<Uuid, RedeemError> {
        let record = match self.repository.take(&hash_token(token)).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Refresh token not found (unknown or already used)");
                return Err(RedeemError::NotFound);
            }
        };

        if record.is_expired_at(Utc::now()) {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(RedeemError::Expired);
        }

        Ok(record.user_id)
    }

    /// Delete a single token without redeeming it. Unknown values are ignored.
    pub async fn revoke(&self, token: &str) -> Result<bool, DatabaseError> {
        self.repository.delete(&hash_token(token)).await
    }
}
