use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::auth::UserBody;
use crate::auth::gate::CurrentUser;
use crate::errors::AppError;
use crate::models::route::TravelMode;
use crate::models::user::Preferences;
use crate::AppState;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Partial preference update; omitted fields keep their current value.
#[derive(Deserialize, Default)]
pub struct UpdatePreferencesRequest {
    pub default_travel_mode: Option<TravelMode>,
    pub avoid_tolls: Option<bool>,
    pub avoid_highways: Option<bool>,
    pub dark_mode: Option<bool>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserBody,
    pub saved_routes_count: i64,
}

#[derive(Serialize)]
pub struct PreferencesResponse {
    pub success: bool,
    pub preferences: Preferences,
}

/// GET /api/users/profile — profile plus saved-route count.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>, AppError> {
    let saved_routes_count = state.routes.count_routes_for_owner(user.id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user: (&user).into(),
        saved_routes_count,
    }))
}

/// PUT /api/users/profile — update the display name.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    let updated = state
        .users
        .update_user_name(user.id, name)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": UserBody::from(&updated),
    })))
}

/// PUT /api/users/preferences — merge the supplied preference fields.
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let mut prefs = user.preferences.clone();
    if let Some(mode) = payload.default_travel_mode {
        prefs.default_travel_mode = mode;
    }
    if let Some(v) = payload.avoid_tolls {
        prefs.avoid_tolls = v;
    }
    if let Some(v) = payload.avoid_highways {
        prefs.avoid_highways = v;
    }
    if let Some(v) = payload.dark_mode {
        prefs.dark_mode = v;
    }

    let updated = state
        .users
        .update_user_preferences(user.id, &prefs)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(Json(PreferencesResponse {
        success: true,
        preferences: updated.preferences,
    }))
}
