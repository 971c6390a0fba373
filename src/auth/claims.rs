/// JWT Claims structure
///
/// Payload of an access token: who the bearer is (`sub`), what tier they hold
/// (`scope`) and the standard time claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Tier;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Access tier of the subject
    pub scope: Tier,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for a token issued at `issued_at` that lives `ttl_seconds`
    pub fn new(user_id: Uuid, scope: Tier, issued_at: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: user_id.to_string(),
            scope,
            iat: issued_at,
            exp: issued_at + ttl_seconds,
        }
    }

    /// Extract user ID from claims; `None` if the subject is not a UUID
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}
