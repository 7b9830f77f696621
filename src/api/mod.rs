use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::gate::require_auth;
use crate::AppState;

pub mod auth;
pub mod routes;
pub mod users;

/// Build the API router. All routes are relative — the caller mounts this
/// under `/api`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Registration, login, and the share capability read path need no
    // bearer token. Everything else goes through the auth gate.
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/routes/shared/:token", get(routes::get_shared_route));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/routes",
            get(routes::list_routes).post(routes::save_route),
        )
        .route(
            "/routes/:id",
            get(routes::get_route)
                .put(routes::update_route)
                .delete(routes::delete_route),
        )
        .route("/routes/:id/share", post(routes::share_route))
        .route(
            "/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/users/preferences", put(users::update_preferences))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected).fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
