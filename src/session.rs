//! Session cookie management.
//!
//! A session is the pair of `access_token` and `refresh_token` cookies. The
//! two slots are always written together on login/signup and cleared together
//! on logout or on any gate failure; no other request state is touched.

use axum::http::header;

use crate::token::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenCodec, TokenError};

/// Cookie name for the access token (short-lived, 15 minutes).
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token (long-lived, 7 days).
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Render a Set-Cookie value for a session slot.
pub fn session_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        name, value, max_age_secs, secure
    )
}

/// Render a Set-Cookie value that deletes a session slot.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

/// Issue a fresh token pair for `subject` and render both session cookies,
/// access first.
pub fn create_session(
    codec: &TokenCodec,
    subject: &str,
    secure: bool,
) -> Result<[String; 2], TokenError> {
    let access = codec.issue_access(subject)?;
    let refresh = codec.issue_refresh(subject)?;
    Ok([
        session_cookie(ACCESS_COOKIE_NAME, &access, ACCESS_TOKEN_TTL_SECS, secure),
        session_cookie(REFRESH_COOKIE_NAME, &refresh, REFRESH_TOKEN_TTL_SECS, secure),
    ])
}

/// Render deletion cookies for both session slots, access first.
pub fn clear_session(secure: bool) -> [String; 2] {
    [
        clear_cookie(ACCESS_COOKIE_NAME, secure),
        clear_cookie(REFRESH_COOKIE_NAME, secure),
    ]
}
