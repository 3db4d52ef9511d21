mod auth;
mod error;
mod profile;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::token::TokenCodec;
use crate::user::HasTokenCodec;

/// Shared state for all API endpoints.
#[derive(Clone)]
pub struct ApiState {
    pub db: Database,
    pub codec: Arc<TokenCodec>,
    pub secure_cookies: bool,
}

impl HasTokenCodec for ApiState {
    fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

/// Create the API router.
pub fn create_api_router(db: Database, codec: Arc<TokenCodec>, secure_cookies: bool) -> Router {
    let state = ApiState {
        db,
        codec,
        secure_cookies,
    };

    Router::new()
        .nest("/auth", auth::router(state.clone()))
        .nest("/user", profile::router(state))
}
