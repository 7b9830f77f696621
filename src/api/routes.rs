use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::gate::CurrentUser;
use crate::auth::ownership;
use crate::errors::AppError;
use crate::models::route::{Measure, Place, SavedRoute, TravelMode, Waypoint};
use crate::share;
use crate::store::{NewRoute, RouteUpdate};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct SaveRouteRequest {
    pub name: String,
    pub origin: Place,
    pub destination: Place,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub travel_mode: TravelMode,
    pub distance: Option<Measure>,
    pub duration: Option<Measure>,
    pub route_data: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateRouteRequest {
    pub name: Option<String>,
    pub origin: Option<Place>,
    pub destination: Option<Place>,
    pub waypoints: Option<Vec<Waypoint>>,
    pub travel_mode: Option<TravelMode>,
    pub distance: Option<Measure>,
    pub duration: Option<Measure>,
    pub route_data: Option<serde_json::Value>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct RouteResponse {
    pub success: bool,
    pub route: SavedRoute,
}

#[derive(Serialize)]
pub struct RouteListResponse {
    pub success: bool,
    pub count: usize,
    pub routes: Vec<SavedRoute>,
}

#[derive(Serialize)]
pub struct ShareResponse {
    pub success: bool,
    pub share_url: String,
    pub share_token: String,
}

impl From<UpdateRouteRequest> for RouteUpdate {
    fn from(req: UpdateRouteRequest) -> Self {
        RouteUpdate {
            name: req.name,
            origin: req.origin,
            destination: req.destination,
            waypoints: req.waypoints,
            travel_mode: req.travel_mode,
            distance: req.distance,
            duration: req.duration,
            route_data: req.route_data,
            tags: req.tags,
            notes: req.notes,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /api/routes — save a new route for the acting account.
pub async fn save_route(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SaveRouteRequest>,
) -> Result<(StatusCode, Json<RouteResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("route name is required".into()));
    }

    let route = state
        .routes
        .insert_route(NewRoute {
            owner_id: user.id,
            name: name.to_string(),
            origin: payload.origin,
            destination: payload.destination,
            waypoints: payload.waypoints,
            travel_mode: payload.travel_mode,
            distance: payload.distance,
            duration: payload.duration,
            route_data: payload.route_data,
            tags: payload.tags,
            notes: payload.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RouteResponse {
            success: true,
            route,
        }),
    ))
}

/// GET /api/routes — the acting account's routes, most recently used first.
pub async fn list_routes(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<RouteListResponse>, AppError> {
    let routes = state.routes.list_routes_for_owner(user.id).await?;
    Ok(Json(RouteListResponse {
        success: true,
        count: routes.len(),
        routes,
    }))
}

/// GET /api/routes/:id — view a route. Existence is checked before
/// ownership, so a nonexistent id is always 404 for everyone.
pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteResponse>, AppError> {
    let route = state
        .routes
        .find_route(id)
        .await?
        .ok_or(AppError::NotFound("route"))?;
    ownership::require_view(&route, &user)?;

    // A view refreshes last_used; re-read so the response carries the
    // updated instant rather than the pre-touch snapshot.
    state.routes.touch_last_used(route.id).await?;
    let route = state
        .routes
        .find_route(id)
        .await?
        .ok_or(AppError::NotFound("route"))?;

    Ok(Json(RouteResponse {
        success: true,
        route,
    }))
}

/// PUT /api/routes/:id — owner-only partial update.
pub async fn update_route(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRouteRequest>,
) -> Result<Json<RouteResponse>, AppError> {
    let route = state
        .routes
        .find_route(id)
        .await?
        .ok_or(AppError::NotFound("route"))?;
    ownership::require_mutate(&route, &user, "update")?;

    let updated = state
        .routes
        .update_route(id, payload.into())
        .await?
        .ok_or(AppError::NotFound("route"))?;

    Ok(Json(RouteResponse {
        success: true,
        route: updated,
    }))
}

/// DELETE /api/routes/:id — owner-only.
pub async fn delete_route(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let route = state
        .routes
        .find_route(id)
        .await?
        .ok_or(AppError::NotFound("route"))?;
    ownership::require_mutate(&route, &user, "delete")?;

    state.routes.delete_route(id).await?;
    tracing::info!(route_id = %id, user_id = %user.id, "route deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "route deleted",
    })))
}

/// POST /api/routes/:id/share — owner-only; returns the route's share
/// capability, minting one (and flipping the route public) on first use.
pub async fn share_route(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareResponse>, AppError> {
    let route = state
        .routes
        .find_route(id)
        .await?
        .ok_or(AppError::NotFound("route"))?;
    ownership::require_mutate(&route, &user, "share")?;

    let share_token =
        share::ensure_share_token(state.routes.as_ref(), &route, state.share_tokens.as_ref())
            .await?;
    let share_url = format!("{}/shared/{}", state.config.frontend_url, share_token);

    Ok(Json(ShareResponse {
        success: true,
        share_url,
        share_token,
    }))
}

/// GET /api/routes/shared/:token — anonymous read path. The capability
/// alone grants access, and only to a route still flagged public.
pub async fn get_shared_route(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<RouteResponse>, AppError> {
    let route = state
        .routes
        .find_route_by_share_token(&token)
        .await?
        .ok_or(AppError::NotFound("shared route"))?;

    Ok(Json(RouteResponse {
        success: true,
        route,
    }))
}
