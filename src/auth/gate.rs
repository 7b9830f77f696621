//! Request authentication gate. Every protected route passes through
//! `require_auth`, which re-verifies the bearer token on each request and
//! resolves the acting account from the user store. All failure modes map
//! to the same 401 so the response never reveals why the credential was
//! rejected.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::AppError;
use crate::models::user::User;
use crate::AppState;

/// The resolved acting account, attached to the request extensions for
/// downstream handlers.
#[derive(Clone)]
pub struct CurrentUser(pub User);

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        tracing::debug!("auth gate: missing bearer token");
        return Err(AppError::Unauthenticated);
    };

    let user_id = state.signer.verify(token).map_err(|e| {
        tracing::debug!("auth gate: token rejected: {}", e);
        AppError::Unauthenticated
    })?;

    // The account may have been removed after the token was issued.
    let user = state
        .users
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(%user_id, "auth gate: account no longer exists");
            AppError::Unauthenticated
        })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
