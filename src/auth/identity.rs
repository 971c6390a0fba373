/// Identity resolution for protected requests
///
/// One signature/expiry check (no I/O) and one point lookup per call. The
/// active flag is re-read every time, so disabling an account takes effect
/// on the next request even while its access tokens are still unexpired.

use std::sync::Arc;

use crate::auth::jwt::TokenCodec;
use crate::error::{AppError, AuthError};
use crate::models::User;
use crate::store::UserStore;

/// Pulls the credential out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    codec: TokenCodec,
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(codec: TokenCodec, users: Arc<dyn UserStore>) -> Self {
        Self { codec, users }
    }

    /// Resolve a bearer credential to the live user record
    ///
    /// # Errors
    /// - `Unauthenticated`: no credential presented
    /// - `InvalidToken`: bad signature, malformed or expired
    /// - `UserNotFound`: subject matches no stored user
    /// - `AccountDisabled`: user exists but is inactive
    pub async fn resolve(&self, credential: Option<&str>) -> Result<User, AppError> {
        let token = credential.ok_or(AuthError::Unauthenticated)?;

        let claims = self.codec.decode(token).map_err(|e| {
            tracing::debug!(reason = %e, "Access token rejected");
            AuthError::InvalidToken
        })?;

        let user_id = claims.user_id().ok_or(AuthError::UserNotFound)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Disabled account presented a valid token");
            return Err(AuthError::AccountDisabled.into());
        }

        Ok(user)
    }
}
