/// Authentication module
///
/// Handles password hashing, access-token signing, refresh-token rotation,
/// session issuance and per-request identity resolution.

mod claims;
mod identity;
mod jwt;
mod password;
mod refresh_token;
mod service;
mod session;

pub use claims::Claims;
pub use identity::{bearer_token, IdentityResolver};
pub use jwt::{TokenCodec, TokenError};
pub use password::{hash_password, verify_password};
pub use refresh_token::{generate_refresh_token, RedeemError, RefreshTokenStore};
pub use service::AuthService;
pub use session::{SessionIssuer, TokenPair};
