use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::gate::CurrentUser;
use crate::auth::password;
use crate::errors::AppError;
use crate::models::user::{Preferences, User};
use crate::store::{NewUser, StoreError};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserBody,
}

#[derive(Serialize)]
pub struct UserBody {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserBody {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            preferences: user.preferences.clone(),
            created_at: user.created_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /api/auth/register — create an account and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".into()));
    }
    if payload.password.len() < 6 {
        return Err(AppError::Validation(
            "password must be at least 6 characters".into(),
        ));
    }

    let password_hash = password::hash(&payload.password)?;
    let user = state
        .users
        .insert_user(NewUser {
            name: name.to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => {
                AppError::Validation("email already registered".into())
            }
            other => other.into(),
        })?;

    let token = state.signer.issue(user.id)?;
    tracing::info!(user_id = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: (&user).into(),
        }),
    ))
}

/// POST /api/auth/login — exchange credentials for a fresh token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let user = state
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !password::verify(&user.password_hash, &payload.password) {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.signer.issue(user.id)?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: (&user).into(),
    }))
}

/// GET /api/auth/me — the account behind the presented token.
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "user": UserBody::from(&user),
    }))
}
