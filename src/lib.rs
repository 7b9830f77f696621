//! Waymark — route planning and sharing API server.
//!
//! Library crate so integration tests in `tests/` can build the real
//! router against the in-memory store.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod share;
pub mod store;

use auth::token::TokenSigner;
use share::ShareTokenSource;
use store::{RouteStore, UserStore};

/// Shared application state passed to handlers and middleware. The stores
/// are trait objects so the Postgres and in-memory backends are
/// interchangeable.
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub routes: Arc<dyn RouteStore>,
    pub signer: TokenSigner,
    pub share_tokens: Arc<dyn ShareTokenSource>,
    pub config: config::Config,
}

/// Assemble the application router: health endpoints plus the API mounted
/// under `/api`. Transport-level layers (CORS, tracing, body limits) are
/// added by the binary.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ok" }))
        .nest("/api", api::api_router(state.clone()))
        .with_state(state)
}
