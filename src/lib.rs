pub mod api;
pub mod cli;
pub mod db;
pub mod gate;
pub mod pages;
pub mod password;
pub mod routes;
pub mod session;
pub mod token;
pub mod user;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;

use db::Database;
use gate::{GateState, auth_gate};
use routes::RouteTable;
use token::TokenCodec;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Debug mode: drop the Secure attribute from session cookies
    pub debug: bool,
}

/// Create the application router with the given configuration.
/// The auth gate wraps everything: pages and API alike pass through it.
pub fn create_app(config: &ServerConfig) -> Router {
    let codec = Arc::new(TokenCodec::new(&config.jwt_secret));
    let secure_cookies = !config.debug;

    let gate_state = GateState {
        codec: codec.clone(),
        routes: Arc::new(RouteTable::default()),
        secure_cookies,
    };

    let api_router = api::create_api_router(config.db.clone(), codec.clone(), secure_cookies);

    let pages_router = Router::new()
        .route("/", get(pages::index))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/auth/login", get(pages::login))
        .route("/auth/signup", get(pages::signup))
        .route("/dashboard", get(pages::dashboard))
        .route("/profile", get(pages::profile))
        .route("/settings", get(pages::settings))
        .route("/account", get(pages::account))
        .route("/account/settings", get(pages::account_settings))
        .with_state(pages::PageState { codec });

    Router::new()
        .merge(pages_router)
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(gate_state, auth_gate))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
