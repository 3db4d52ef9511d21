//! Session lifecycle endpoints.
//!
//! - POST `/signup` - Create an account and open a session
//! - POST `/login` - Verify credentials and open a session
//! - POST `/logout` - Clear both session cookies
//! - GET `/refresh` - Exchange the refresh cookie for a new access cookie
//!
//! Signup and login are the only writers of the refresh cookie; the refresh
//! endpoint duplicates the gate's rotation path for clients that want to
//! force a refresh out-of-band.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{debug, error};

use super::ApiState;
use super::error::{ApiError, ResultExt};
use crate::password;
use crate::session::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, clear_session, create_session, get_cookie,
    session_cookie,
};
use crate::token::{ACCESS_TOKEN_TTL_SECS, Decoded};

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", get(refresh))
        .with_state(state)
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

fn validate_email(email: &str) -> Result<&str, ApiError> {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 {
        return Err(ApiError::bad_request("Invalid email"));
    }
    // Minimal shape check: local part, one '@', dotted domain.
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::bad_request("Invalid email"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(' ') {
        return Err(ApiError::bad_request("Invalid email"));
    }
    Ok(email)
}

async fn signup(
    State(state): State<ApiState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_email(&payload.email)?;

    if payload.password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let existing = state
        .db
        .users()
        .find_by_email(email)
        .await
        .db_err("Failed to check email availability")?;
    if existing.is_some() {
        return Err(ApiError::conflict("Email already taken"));
    }

    let digest = password::hash(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to create account")
    })?;

    state
        .db
        .users()
        .create(email, &digest, payload.name.as_deref().unwrap_or(""))
        .await
        .map_err(|e| match &e {
            // A concurrent signup can slip past the availability check and
            // land on the UNIQUE constraint instead.
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::conflict("Email already taken")
            }
            _ => ApiError::db_error("Failed to create user", e),
        })?;

    let [access, refresh] = open_session(&state, email)?;
    debug!(subject = %email, "account created, session opened");

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)]),
        Json(serde_json::json!({ "success": true })),
    ))
}

async fn login(
    State(state): State<ApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();

    let user = state
        .db
        .users()
        .find_by_email(email)
        .await
        .db_err("Failed to look up user")?;

    // Unknown email and wrong password are indistinguishable to the caller.
    let Some(user) = user else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };
    if !password::verify(&payload.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let [access, refresh] = open_session(&state, &user.email)?;
    debug!(subject = %user.email, "session opened");

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)]),
        Json(serde_json::json!({ "success": true })),
    ))
}

/// Logout - clear both session cookies. Stateless tokens cannot be revoked,
/// so the outstanding pair simply ages out.
async fn logout(State(state): State<ApiState>) -> impl IntoResponse {
    let [access, refresh] = clear_session(state.secure_cookies);
    debug!("session cleared");

    (
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)]),
        Json(serde_json::json!({ "success": true })),
    )
}

/// Exchange a valid refresh cookie for a fresh access cookie.
async fn refresh(
    State(state): State<ApiState>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let claims = match state.codec.decode_refresh(refresh_token) {
        Decoded::Valid(claims) => claims,
        Decoded::Expired | Decoded::Invalid => {
            return Err(ApiError::unauthorized("Invalid refresh token"));
        }
    };

    let access = state.codec.issue_access(&claims.sub).map_err(|e| {
        error!("Failed to issue access token: {}", e);
        ApiError::internal("Failed to refresh session")
    })?;
    let cookie = session_cookie(
        ACCESS_COOKIE_NAME,
        &access,
        ACCESS_TOKEN_TTL_SECS,
        state.secure_cookies,
    );
    debug!(subject = %claims.sub, "access token refreshed");

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(serde_json::json!({ "success": true })),
    ))
}

fn open_session(state: &ApiState, subject: &str) -> Result<[String; 2], ApiError> {
    create_session(&state.codec, subject, state.secure_cookies).map_err(|e| {
        error!("Failed to issue session tokens: {}", e);
        ApiError::internal("Failed to open session")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("  a@b.com  ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }
}
