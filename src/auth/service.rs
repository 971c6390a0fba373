/// Register / login / refresh orchestration
///
/// Each operation is single-shot. `refresh` implements rotation: the
/// presented token is consumed and a brand-new pair is minted, so an old
/// value never works twice.

use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{SessionIssuer, TokenPair};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::models::{NewUser, Tier, User};
use crate::store::UserStore;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: SessionIssuer,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, sessions: SessionIssuer) -> Self {
        Self { users, sessions }
    }

    /// Create an account and sign it in
    ///
    /// # Errors
    /// - `EmailConflict` if any user (active or not) has this email
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        tier: Tier,
    ) -> Result<(User, TokenPair), AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailConflict.into());
        }

        let new_user = NewUser {
            email: email.to_string(),
            password_hash: hash_password(password)?,
            tier,
        };

        // A concurrent registration can still win the race to the unique index
        let user = self.users.insert(new_user).await.map_err(|e| match e {
            DatabaseError::UniqueConstraintViolation(_) => AppError::Auth(AuthError::EmailConflict),
            other => AppError::Database(other),
        })?;

        let tokens = self.sessions.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Exchange credentials for a token pair
    ///
    /// # Errors
    /// - `InvalidCredentials` if the email is unknown or the password is wrong
    /// - `AccountDisabled` if the credentials match an inactive user
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .filter(|user| verify_password(password, &user.password_hash))
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled.into());
        }

        let tokens = self.sessions.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Consume a refresh token and mint a replacement pair
    ///
    /// # Errors
    /// - `MissingToken` if nothing was presented
    /// - `InvalidRefreshToken` if the value is unknown or already used
    /// - `RefreshExpired` if the value was past its expiry (it is deleted)
    /// - `UserUnavailable` if the owner is gone or inactive
    pub async fn refresh(&self, presented: Option<&str>) -> Result<(User, TokenPair), AppError> {
        let presented = presented
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let user_id = self.sessions.refresh_tokens().redeem(presented).await?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AuthError::UserUnavailable)?;

        let tokens = self.sessions.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Delete one refresh token; unknown values are not an error
    ///
    /// # Errors
    /// - `MissingToken` if nothing was presented
    pub async fn logout(&self, presented: Option<&str>) -> Result<(), AppError> {
        let presented = presented
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingToken)?;

        if !self.sessions.refresh_tokens().revoke(presented).await? {
            tracing::debug!("Logout presented an unknown refresh token");
        }
        Ok(())
    }
}
