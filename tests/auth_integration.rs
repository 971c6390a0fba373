use chrono::{Duration, Utc};
use idioms_api::configuration::{ApplicationSettings, JwtSettings};
use idioms_api::models::RefreshTokenRecord;
use idioms_api::startup::run;
use idioms_api::store::{RefreshTokenRepository, Stores, UserStore};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub stores: Stores,
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let stores = Stores::in_memory();
    let jwt_config = JwtSettings {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 2_592_000,
    };
    let application = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        secure_cookies: false,
    };

    let server = run(listener, stores.clone(), jwt_config, application)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, stores }
}

impl TestApp {
    async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/auth/register", &json!({ "email": email, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    async fn get_me(&self, access_token: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(&format!("{}/auth/me", self.address))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

fn token(body: &Value, field: &str) -> String {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing {} in {}", field, body))
        .to_string()
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_token_pair() {
    let app = spawn_app();

    let body = app.register("a@x.com", "secret123").await;

    assert!(body["access_token"].as_str().is_some());
    assert_eq!(43, token(&body, "refresh_token").len());
    assert_eq!("bearer", body["token_type"]);
    assert_eq!(900, body["expires_in"]);
}

#[tokio::test]
async fn register_accepts_service_tier_alias() {
    let app = spawn_app();

    let response = app
        .post_json(
            "/auth/register",
            &json!({ "email": "p@x.com", "password": "secret123", "service_tier": "premium" }),
        )
        .await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();

    let me: Value = app.get_me(&token(&body, "access_token")).await.json().await.unwrap();
    assert_eq!("premium", me["tier"]);
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app();
    app.register("a@x.com", "secret123").await;

    let response = app
        .post_json("/auth/register", &json!({ "email": "a@x.com", "password": "other" }))
        .await;

    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app();

    let cases = vec![
        (json!({ "email": "not-an-email", "password": "secret123" }), "invalid email"),
        (json!({ "email": "a@x.com", "password": "" }), "empty password"),
        (json!({ "email": "a@x.com" }), "missing password"),
        (json!({ "email": "a@x.com", "password": "pw", "tier": "root" }), "unknown tier"),
    ];

    for (body, description) in cases {
        let response = app.post_json("/auth/register", &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 for {}",
            description
        );
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_fresh_pair_and_sets_cookies() {
    let app = spawn_app();
    let registered = app.register("a@x.com", "secret123").await;

    let response = app
        .post_json("/auth/login", &json!({ "email": "a@x.com", "password": "secret123" }))
        .await;
    assert_eq!(200, response.status().as_u16());

    let cookies: Vec<String> = response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("access_token=") && c.contains("HttpOnly")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refresh_token=") && c.contains("Path=/auth/refresh")));

    let body: Value = response.json().await.unwrap();
    assert_ne!(token(&registered, "refresh_token"), token(&body, "refresh_token"));
}

#[tokio::test]
async fn login_accepts_username_field() {
    let app = spawn_app();
    app.register("a@x.com", "secret123").await;

    let response = app
        .post_json("/auth/login", &json!({ "username": "a@x.com", "password": "secret123" }))
        .await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn login_returns_401_for_bad_credentials() {
    let app = spawn_app();
    app.register("a@x.com", "secret123").await;

    let wrong_password = app
        .post_json("/auth/login", &json!({ "email": "a@x.com", "password": "nope" }))
        .await;
    let unknown_user = app
        .post_json("/auth/login", &json!({ "email": "b@x.com", "password": "secret123" }))
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());
}

#[tokio::test]
async fn disabled_account_is_rejected_everywhere() {
    let app = spawn_app();
    let body = app.register("a@x.com", "secret123").await;
    let access_token = token(&body, "access_token");

    let me: Value = app.get_me(&access_token).await.json().await.unwrap();
    let user_id = Uuid::parse_str(me["id"].as_str().unwrap()).unwrap();
    app.stores.users.set_active(user_id, false).await.unwrap();

    let login = app
        .post_json("/auth/login", &json!({ "email": "a@x.com", "password": "secret123" }))
        .await;
    assert_eq!(403, login.status().as_u16());

    // The access token is still unexpired but the account is not
    assert_eq!(403, app.get_me(&access_token).await.status().as_u16());

    let refresh = app
        .post_json("/auth/refresh", &json!({ "refresh_token": token(&body, "refresh_token") }))
        .await;
    assert_eq!(401, refresh.status().as_u16());
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_rotates_and_rejects_reuse() {
    let app = spawn_app();
    let body = app.register("a@x.com", "secret123").await;
    let old_refresh = token(&body, "refresh_token");

    let response = app
        .post_json("/auth/refresh", &json!({ "refresh_token": old_refresh }))
        .await;
    assert_eq!(200, response.status().as_u16());
    let rotated: Value = response.json().await.unwrap();
    assert_ne!(old_refresh, token(&rotated, "refresh_token"));

    let reuse = app
        .post_json("/auth/refresh", &json!({ "refresh_token": old_refresh }))
        .await;
    assert_eq!(400, reuse.status().as_u16());
}

#[tokio::test]
async fn refresh_reads_the_cookie() {
    let app = spawn_app();
    let body = app.register("a@x.com", "secret123").await;

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", app.address))
        .header(
            reqwest::header::COOKIE,
            format!("refresh_token={}", token(&body, "refresh_token")),
        )
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn cookie_jar_carries_session_across_refreshes() {
    let app = spawn_app();
    app.register("a@x.com", "secret123").await;
    let client = reqwest::Client::builder().cookie_store(true).build().unwrap();

    let login = client
        .post(&format!("{}/auth/login", app.address))
        .json(&json!({ "email": "a@x.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, login.status().as_u16());

    for _ in 0..2 {
        let response = client
            .post(&format!("{}/auth/refresh", app.address))
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status().as_u16());
    }
}

#[tokio::test]
async fn refresh_returns_400_for_missing_or_unknown_token() {
    let app = spawn_app();

    let missing = reqwest::Client::new()
        .post(&format!("{}/auth/refresh", app.address))
        .send()
        .await
        .unwrap();
    let unknown = app
        .post_json("/auth/refresh", &json!({ "refresh_token": "never-issued" }))
        .await;

    assert_eq!(400, missing.status().as_u16());
    assert_eq!(400, unknown.status().as_u16());
}

#[tokio::test]
async fn refresh_returns_403_for_expired_token() {
    let app = spawn_app();
    let body = app.register("a@x.com", "secret123").await;
    let me: Value = app
        .get_me(&token(&body, "access_token"))
        .await
        .json()
        .await
        .unwrap();

    let value = "planted-expired-refresh-token";
    app.stores
        .refresh_tokens
        .insert(&RefreshTokenRecord {
            user_id: Uuid::parse_str(me["id"].as_str().unwrap()).unwrap(),
            token_hash: format!("{:x}", Sha256::digest(value.as_bytes())),
            expires_at: Utc::now() - Duration::minutes(1),
        })
        .await
        .unwrap();

    let expired = app
        .post_json("/auth/refresh", &json!({ "refresh_token": value }))
        .await;
    assert_eq!(403, expired.status().as_u16());

    // Expired tokens are deleted on presentation
    let again = app
        .post_json("/auth/refresh", &json!({ "refresh_token": value }))
        .await;
    assert_eq!(400, again.status().as_u16());
}

// --- Logout Tests ---

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let app = spawn_app();
    let body = app.register("a@x.com", "secret123").await;
    let refresh_token = token(&body, "refresh_token");

    let logout = app
        .post_json("/auth/logout", &json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(204, logout.status().as_u16());

    let refresh = app
        .post_json("/auth/refresh", &json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(400, refresh.status().as_u16());

    let missing = reqwest::Client::new()
        .post(&format!("{}/auth/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(400, missing.status().as_u16());
}

// --- Current User Tests ---

#[tokio::test]
async fn get_current_user_returns_profile() {
    let app = spawn_app();
    let body = app.register("a@x.com", "secret123").await;

    let response = app.get_me(&token(&body, "access_token")).await;
    assert_eq!(200, response.status().as_u16());

    let me: Value = response.json().await.unwrap();
    assert_eq!("a@x.com", me["email"]);
    assert_eq!("free", me["tier"]);
    assert_eq!(true, me["is_active"]);
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn get_current_user_requires_valid_token() {
    let app = spawn_app();

    let no_token = reqwest::Client::new()
        .get(&format!("{}/auth/me", app.address))
        .send()
        .await
        .unwrap();
    let bad_token = app.get_me("not.a.jwt").await;
    let basic = reqwest::Client::new()
        .get(&format!("{}/auth/me", app.address))
        .header("Authorization", "Basic YTpi")
        .send()
        .await
        .unwrap();

    assert_eq!(401, no_token.status().as_u16());
    assert_eq!(401, bad_token.status().as_u16());
    assert_eq!(401, basic.status().as_u16());
}
