//! Minimal page handlers.
//!
//! Rendering is out of scope; these exist so route policy is exercised
//! end-to-end. The dashboard reads the gate's adopted subject from the
//! request extension rather than re-decoding the inbound cookie.

use axum::{Extension, response::Html};
use std::sync::Arc;

use crate::gate::AuthContext;
use crate::token::TokenCodec;
use crate::user::{HasTokenCodec, MaybeUser};

/// State for page handlers that resolve the caller themselves.
#[derive(Clone)]
pub struct PageState {
    pub codec: Arc<TokenCodec>,
}

impl HasTokenCodec for PageState {
    fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, body
    ))
}

pub async fn index(MaybeUser(user): MaybeUser) -> Html<String> {
    let body = match user {
        Some(subject) => format!("<p>Signed in as {}</p>", subject),
        None => "<p><a href=\"/auth/login\">Log in</a></p>".to_string(),
    };
    page("Home", &body)
}

pub async fn about() -> Html<String> {
    page("About", "")
}

pub async fn contact() -> Html<String> {
    page("Contact", "")
}

pub async fn login() -> Html<String> {
    page("Log in", "")
}

pub async fn signup() -> Html<String> {
    page("Sign up", "")
}

pub async fn dashboard(Extension(auth): Extension<AuthContext>) -> Html<String> {
    let subject = auth.subject.as_deref().unwrap_or("");
    page("Dashboard", &format!("<p>Signed in as {}</p>", subject))
}

pub async fn profile() -> Html<String> {
    page("Profile", "")
}

pub async fn settings() -> Html<String> {
    page("Settings", "")
}

pub async fn account() -> Html<String> {
    page("Account", "")
}

pub async fn account_settings() -> Html<String> {
    page("Account settings", "")
}
