//! Tests for the explicit refresh endpoint: GET /api/auth/refresh exchanges
//! a valid refresh cookie for a fresh access cookie, and nothing else.
//!
//! The gate runs in front of this endpoint like any other, so a bad refresh
//! cookie without a valid access cookie is torn down by the gate before the
//! handler ever sees it. The handler's own unauthorized responses surface
//! when the access cookie is still valid.

mod common;

use axum::http::StatusCode;
use common::*;
use tokengate::token::{Decoded, TokenKind};
use tower::ServiceExt;

#[tokio::test]
async fn test_refresh_with_valid_cookie_issues_access_token() {
    let (app, _db, codec) = create_test_app().await;
    let refresh = codec.issue_refresh("a@b.com").unwrap();

    let response = app
        .oneshot(get_request(
            "/api/auth/refresh",
            Some(&refresh_cookie_only(&refresh)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = extract_set_cookies(&response);
    let access = cookie_value(&cookies, "access_token").unwrap();
    match codec.decode_access(access) {
        Decoded::Valid(claims) => assert_eq!(claims.sub, "a@b.com"),
        other => panic!("issued token must decode, got {:?}", other),
    }

    // The refresh cookie itself is left untouched.
    assert!(cookies.iter().all(|c| !c.starts_with("refresh_token=")));
}

#[tokio::test]
async fn test_refresh_without_cookies_unauthorized() {
    let (app, _db, _codec) = create_test_app().await;

    let response = app
        .oneshot(get_request("/api/auth/refresh", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No refresh token");
}

#[tokio::test]
async fn test_refresh_with_garbage_cookie_unauthorized() {
    // A valid access cookie carries the request past the gate; the handler
    // then rejects the garbage refresh token itself.
    let (app, _db, codec) = create_test_app().await;
    let access = codec.issue_access("a@b.com").unwrap();

    let response = app
        .oneshot(get_request(
            "/api/auth/refresh",
            Some(&auth_cookies(&access, "garbage")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid refresh token");
}

#[tokio::test]
async fn test_refresh_with_expired_cookie_unauthorized() {
    let (app, _db, codec) = create_test_app().await;
    let access = codec.issue_access("a@b.com").unwrap();
    let refresh = expired_token("a@b.com", TokenKind::Refresh);

    let response = app
        .oneshot(get_request(
            "/api/auth/refresh",
            Some(&auth_cookies(&access, &refresh)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_access_token_in_refresh_slot() {
    // An access token must never mint new credentials.
    let (app, _db, codec) = create_test_app().await;
    let access = codec.issue_access("a@b.com").unwrap();

    let response = app
        .oneshot(get_request(
            "/api/auth/refresh",
            Some(&auth_cookies(&access, &access)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_only_garbage_refresh_torn_down_by_gate() {
    // No access cookie plus an unverifiable refresh cookie is a gate-level
    // failure: session cleared and redirected before the handler runs.
    let (app, _db, _codec) = create_test_app().await;

    let response = app
        .oneshot(get_request(
            "/api/auth/refresh",
            Some("refresh_token=garbage"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let cookies = extract_set_cookies(&response);
    assert!(has_cleared_cookie(&cookies, "access_token"));
    assert!(has_cleared_cookie(&cookies, "refresh_token"));
}

#[tokio::test]
async fn test_refreshed_token_works_on_protected_route() {
    let (app, _db, codec) = create_test_app().await;
    let refresh = codec.issue_refresh("a@b.com").unwrap();

    let response = app
        .clone()
        .oneshot(get_request(
            "/api/auth/refresh",
            Some(&refresh_cookie_only(&refresh)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = extract_set_cookies(&response);
    let access = cookie_value(&cookies, "access_token").unwrap().to_string();

    let response = app
        .oneshot(get_request(
            "/dashboard",
            Some(&format!("access_token={}", access)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
