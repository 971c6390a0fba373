mod auth;
mod health_check;
mod idioms;

pub use auth::{get_current_user, login, logout, refresh, register, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use health_check::health_check;
pub use idioms::{idioms_by_letter, idioms_by_synonym, random_idiom, search_idioms};
