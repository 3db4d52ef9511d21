#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use jsonwebtoken::{EncodingKey, Header};
use std::time::{SystemTime, UNIX_EPOCH};
use tokengate::db::Database;
use tokengate::token::{Claims, TokenCodec, TokenKind};
use tokengate::{ServerConfig, create_app};

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-for-integration-tests";

/// Create a test app backed by an in-memory database.
/// Returns (app, db, codec) so tests can seed users and mint tokens.
pub async fn create_test_app() -> (axum::Router, Database, TokenCodec) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let codec = TokenCodec::new(TEST_SECRET);
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        debug: true, // Tests run without HTTPS
    };
    (create_app(&config), db, codec)
}

/// Build a GET request with an optional Cookie header.
pub fn get_request(uri: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header("cookie", cookies);
    }
    builder.body(Body::empty()).unwrap()
}

/// Build a JSON POST request with an optional Cookie header.
pub fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
    cookies: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(cookies) = cookies {
        builder = builder.header("cookie", cookies);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn auth_cookies(access_token: &str, refresh_token: &str) -> String {
    format!(
        "access_token={}; refresh_token={}",
        access_token, refresh_token
    )
}

pub fn refresh_cookie_only(refresh_token: &str) -> String {
    format!("refresh_token={}", refresh_token)
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Check if cookies contain a token being cleared (Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=", cookie_name)) && c.contains("Max-Age=0"))
}

/// Check if cookies contain a new access token
pub fn has_new_access_token(cookies: &[String]) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with("access_token=") && !c.contains("Max-Age=0"))
}

/// Pull the raw token value out of a Set-Cookie string for the given name.
pub fn cookie_value<'a>(cookies: &'a [String], cookie_name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", cookie_name);
    cookies
        .iter()
        .find(|c| c.starts_with(&prefix) && !c.contains("Max-Age=0"))
        .and_then(|c| c.strip_prefix(&prefix))
        .and_then(|rest| rest.split(';').next())
}

/// Encode a token with an expiry in the past, signed with the test secret.
pub fn expired_token(subject: &str, kind: TokenKind) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: subject.to_string(),
        kind,
        iat: now - 100,
        exp: now - 50,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap()
}

/// Read the response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not valid JSON")
}
