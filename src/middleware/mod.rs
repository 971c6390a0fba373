/// Middleware module
///
/// Custom middleware for authentication and other cross-cutting concerns.

mod identity_middleware;

pub use identity_middleware::IdentityMiddleware;
