//! Current-user resolution for downstream handlers.
//!
//! Read-only: decodes the inbound access cookie and nothing else. Rotation is
//! exclusively the gate's job, because only the gate runs early enough to
//! attach a rewritten cookie to the outgoing response. Handlers that need the
//! post-rotation identity mid-request should read the gate's [`AuthContext`]
//! extension instead of re-decoding the raw cookie.
//!
//! [`AuthContext`]: crate::gate::AuthContext

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::session::{ACCESS_COOKIE_NAME, get_cookie};
use crate::token::{Decoded, TokenCodec};

/// Trait for state types that expose the token codec.
pub trait HasTokenCodec {
    fn codec(&self) -> &TokenCodec;
}

/// Return the subject of a valid inbound access token, if any.
/// Expired and invalid tokens both resolve to `None`; never rotates.
pub fn current_user(headers: &HeaderMap, codec: &TokenCodec) -> Option<String> {
    let token = get_cookie(headers, ACCESS_COOKIE_NAME)?;
    match codec.decode_access(token) {
        Decoded::Valid(claims) => Some(claims.sub),
        Decoded::Expired | Decoded::Invalid => None,
    }
}

/// Rejection for [`CurrentUser`]: plain 401 JSON, no redirect and no cookie
/// teardown. Data endpoints are not navigable pages.
#[derive(Debug)]
pub struct Unauthenticated;

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthorized",
            }),
        )
            .into_response()
    }
}

/// Extractor for API endpoints that require an authenticated subject.
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: HasTokenCodec + Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        current_user(&parts.headers, state.codec())
            .map(CurrentUser)
            .ok_or(Unauthenticated)
    }
}

/// Infallible variant for handlers that work with or without a session.
pub struct MaybeUser(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: HasTokenCodec + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(current_user(&parts.headers, state.codec())))
    }
}
