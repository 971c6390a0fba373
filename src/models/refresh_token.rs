use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stored refresh-token capability.
///
/// `token_hash` is the SHA-256 hex digest of the value handed to the client;
/// the plaintext value is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
