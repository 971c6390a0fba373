/// Domain records shared by the auth core, the stores and the HTTP layer

mod idiom;
mod refresh_token;
mod user;

pub use idiom::Idiom;
pub use refresh_token::RefreshTokenRecord;
pub use user::{NewUser, Tier, User};
