/// Session issuance
///
/// The single authority on what a successful login produces: one access
/// token and one freshly persisted refresh token.

use serde::Serialize;

use crate::auth::jwt::TokenCodec;
use crate::auth::refresh_token::RefreshTokenStore;
use crate::error::AppError;
use crate::models::User;

/// Authentication response with access and refresh tokens
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct SessionIssuer {
    codec: TokenCodec,
    refresh_tokens: RefreshTokenStore,
}

impl SessionIssuer {
    pub fn new(codec: TokenCodec, refresh_tokens: RefreshTokenStore) -> Self {
        Self {
            codec,
            refresh_tokens,
        }
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenStore {
        &self.refresh_tokens
    }

    /// Issue a token pair for a persisted user
    ///
    /// # Errors
    /// - `PreconditionFailed` if the user carries no assigned identity
    /// - Database errors from persisting the refresh token
    pub async fn issue_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        if user.id.is_nil() {
            return Err(AppError::PreconditionFailed(
                "user must be persisted before issuing tokens".to_string(),
            ));
        }

        // Signing is in-memory; it runs first so a failure leaves nothing stored
        let access_token = self.codec.encode(user.id, user.tier)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.codec.ttl_seconds(),
        })
    }
}
