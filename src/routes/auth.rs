/// Authentication Routes
///
/// Handles user registration, login, token refresh, logout and current user
/// information.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, TokenPair};
use crate::configuration::ApplicationSettings;
use crate::error::{AppError, ErrorContext};
use crate::models::{Tier, User};
use crate::validators::{is_valid_email, is_valid_password};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default, alias = "service_tier")]
    pub tier: Tier,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

/// Refresh/logout request body; the cookie takes precedence when present
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub tier: Tier,
    pub is_active: bool,
    pub created_at: String,
}

fn auth_cookie(name: &'static str, value: String, path: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path(path)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .finish()
}

fn removal_cookie(name: &'static str, path: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = auth_cookie(name, String::new(), path, secure);
    cookie.make_removal();
    cookie
}

/// 200 with the pair in the body, mirrored into http-only cookies
fn tokens_with_cookies(tokens: TokenPair, secure: bool) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(auth_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone(), "/", secure))
        .cookie(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
            REFRESH_COOKIE_PATH,
            secure,
        ))
        .json(tokens)
}

/// Refresh value from the cookie, falling back to the JSON body
fn presented_refresh_token(
    req: &HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
) -> Option<String> {
    req.cookie(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| body.and_then(|body| body.into_inner().refresh_token))
}

/// POST /auth/register
///
/// Register a new user with email, password and optional tier.
/// Returns access token and refresh token on success.
///
/// # Errors
/// - 400: Validation errors (invalid email, empty password)
/// - 409: Email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let (user, tokens) = auth.register(&email, &form.password, form.tier).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        tier = %user.tier,
        "User registered successfully"
    );

    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /auth/login
///
/// Authenticate user with email and password.
///
/// # Errors
/// - 400: Validation error (invalid email format)
/// - 401: Invalid credentials (email not found or wrong password)
/// - 403: Account is disabled
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
    application: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let email = is_valid_email(&form.email)?;
    let (user, tokens) = auth.login(&email, &form.password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User logged in successfully"
    );

    Ok(tokens_with_cookies(tokens, application.secure_cookies))
}

/// POST /auth/refresh
///
/// Exchange a refresh token (cookie or body) for a brand-new pair.
/// The presented token is consumed whether or not a new pair is issued.
///
/// # Errors
/// - 400: Missing, unknown or already-used refresh token
/// - 403: Refresh token expired
/// - 401: Owning user is gone or disabled
pub async fn refresh(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    auth: web::Data<AuthService>,
    application: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let presented = presented_refresh_token(&req, body);
    let (user, tokens) = auth.refresh(presented.as_deref()).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "Token refreshed successfully"
    );

    Ok(tokens_with_cookies(tokens, application.secure_cookies))
}

/// POST /auth/logout
///
/// Delete the presented refresh token and clear the auth cookies.
///
/// # Errors
/// - 400: No refresh token presented
pub async fn logout(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    auth: web::Data<AuthService>,
    application: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_refresh_token(&req, body);
    auth.logout(presented.as_deref()).await?;

    let secure = application.secure_cookies;
    Ok(HttpResponse::NoContent()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE, "/", secure))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE, REFRESH_COOKIE_PATH, secure))
        .finish())
}

/// GET /auth/me
///
/// **Requires a valid access token**; the user is injected by
/// `IdentityMiddleware`.
pub async fn get_current_user(user: web::ReqData<User>) -> HttpResponse {
    let context = ErrorContext::new("current_user").with_user_id(user.id.to_string());
    tracing::debug!(request_id = %context.request_id, user_id = ?context.user_id, "Current user requested");

    HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        email: user.email.clone(),
        tier: user.tier,
        is_active: user.is_active,
        created_at: user.created_at.to_rfc3339(),
    })
}
