//! The request-time auth gate.
//!
//! Runs once per inbound request, before any handler. The decision core is a
//! pure function over plain data (path plus the two raw cookie values); the
//! surrounding middleware does the only genuine side effects, reading the
//! Cookie header and writing Set-Cookie on the response.
//!
//! Evaluation order:
//! 1. Guest routes short-circuit: login/signup must render even for garbage
//!    credentials.
//! 2. Decode the access cookie into Missing / Valid / Expired / Invalid.
//! 3. Rotation is attempted when the access token is legitimately expired, or
//!    absent while a refresh cookie is present. The refresh token is fully
//!    verified on its own; failure rejects.
//! 4. An invalid access token rejects outright, even when a refresh cookie is
//!    present: a tampered access cookie must not ride along with a valid
//!    refresh cookie into extended trust.
//! 5. Protected routes require a resolved subject.
//! 6. Rejection is total: both cookies cleared, redirect to the login page.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::routes::{LOGIN_PATH, RouteClass, RouteTable};
use crate::session::{self, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, get_cookie};
use crate::token::{ACCESS_TOKEN_TTL_SECS, Claims, Decoded, TokenCodec};

/// Shared state for the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub codec: Arc<TokenCodec>,
    pub routes: Arc<RouteTable>,
    pub secure_cookies: bool,
}

/// Identity adopted by the gate for this request, inserted as a request
/// extension. After a rotation this carries the post-rotation subject, while
/// the raw inbound cookie still holds the expired token; downstream code
/// wanting the resolved identity should read this, not re-decode the cookie.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject: Option<String>,
}

/// Plain-data view of a request, as the decision core sees it.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub access: Option<&'a str>,
    pub refresh: Option<&'a str>,
}

/// Decoded state of the inbound access credential.
#[derive(Debug)]
enum AccessState {
    Missing,
    Valid(Claims),
    Expired,
    Invalid,
}

/// A successful rotation: a freshly minted access token and its subject.
#[derive(Debug)]
struct Rotation {
    subject: String,
    token: String,
}

/// Final decision for a request.
#[derive(Debug)]
pub enum Verdict {
    /// Let the request through. `reissued` carries a fresh access token to
    /// attach to the response when a rotation happened.
    Pass {
        subject: Option<String>,
        reissued: Option<String>,
    },
    /// Clear both cookies and redirect to the login page.
    Reject,
}

fn read_access(codec: &TokenCodec, access: Option<&str>) -> AccessState {
    match access {
        None => AccessState::Missing,
        Some(token) => match codec.decode_access(token) {
            Decoded::Valid(claims) => AccessState::Valid(claims),
            Decoded::Expired => AccessState::Expired,
            Decoded::Invalid => AccessState::Invalid,
        },
    }
}

/// Attempt to mint a new access token from the refresh cookie.
/// `None` means the rotation failed and the session must be torn down.
fn try_rotate(codec: &TokenCodec, refresh: Option<&str>) -> Option<Rotation> {
    let refresh = refresh?;
    match codec.decode_refresh(refresh) {
        Decoded::Valid(claims) => {
            let token = codec.issue_access(&claims.sub).ok()?;
            debug!(subject = %claims.sub, "access token rotated");
            Some(Rotation {
                subject: claims.sub,
                token,
            })
        }
        Decoded::Expired | Decoded::Invalid => {
            debug!("refresh token rejected");
            None
        }
    }
}

/// The pure decision core. No I/O; verification is a function of the tokens,
/// the signing secret, and the current time.
pub fn evaluate(codec: &TokenCodec, routes: &RouteTable, req: GateRequest<'_>) -> Verdict {
    let class = routes.classify(req.path);
    if class == RouteClass::Guest {
        debug!(path = %req.path, "guest route, skipping validation");
        return Verdict::Pass {
            subject: None,
            reissued: None,
        };
    }

    let (subject, reissued) = match read_access(codec, req.access) {
        AccessState::Expired => {
            debug!(path = %req.path, "access token expired, attempting rotation");
            match try_rotate(codec, req.refresh) {
                Some(rotation) => (Some(rotation.subject), Some(rotation.token)),
                None => return Verdict::Reject,
            }
        }
        AccessState::Missing if req.refresh.is_some() => {
            debug!(path = %req.path, "access token missing, attempting rotation");
            match try_rotate(codec, req.refresh) {
                Some(rotation) => (Some(rotation.subject), Some(rotation.token)),
                None => return Verdict::Reject,
            }
        }
        AccessState::Missing => (None, None),
        AccessState::Invalid => {
            debug!(path = %req.path, "access token invalid");
            return Verdict::Reject;
        }
        AccessState::Valid(claims) => (Some(claims.sub), None),
    };

    if class == RouteClass::Protected && subject.is_none() {
        debug!(path = %req.path, "protected route without identity");
        return Verdict::Reject;
    }

    Verdict::Pass { subject, reissued }
}

/// Build the logout response: both cookies cleared, redirect to login.
fn reject_response(secure: bool) -> Response {
    let mut response = Redirect::temporary(LOGIN_PATH).into_response();
    let headers = response.headers_mut();
    for cookie in session::clear_session(secure) {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Axum middleware wrapping the decision core. Applied to the whole router;
/// writes happen only after the verdict, so an aborted request leaves no
/// partial cookie state.
pub async fn auth_gate(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let verdict = {
        let headers = request.headers();
        evaluate(
            &state.codec,
            &state.routes,
            GateRequest {
                path: &path,
                access: get_cookie(headers, ACCESS_COOKIE_NAME),
                refresh: get_cookie(headers, REFRESH_COOKIE_NAME),
            },
        )
    };

    match verdict {
        Verdict::Reject => reject_response(state.secure_cookies),
        Verdict::Pass { subject, reissued } => {
            request.extensions_mut().insert(AuthContext { subject });
            let mut response = next.run(request).await;
            if let Some(token) = reissued {
                let cookie = session::session_cookie(
                    ACCESS_COOKIE_NAME,
                    &token,
                    ACCESS_TOKEN_TTL_SECS,
                    state.secure_cookies,
                );
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
            response
        }
    }
}
