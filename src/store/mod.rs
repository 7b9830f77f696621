//! Persistence interfaces. The service treats both stores as external,
//! already-consistent collaborators: single-document reads and writes,
//! no cross-request coordination.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::route::{Measure, Place, SavedRoute, TravelMode, Waypoint};
use crate::models::user::{Preferences, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("share token already in use")]
    DuplicateShareToken,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

pub struct NewRoute {
    pub owner_id: Uuid,
    pub name: String,
    pub origin: Place,
    pub destination: Place,
    pub waypoints: Vec<Waypoint>,
    pub travel_mode: TravelMode,
    pub distance: Option<Measure>,
    pub duration: Option<Measure>,
    pub route_data: Option<serde_json::Value>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

/// Partial update for a route. `None` fields keep their current value.
#[derive(Default)]
pub struct RouteUpdate {
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

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `DuplicateEmail` if the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError>;
    async fn update_user_preferences(
        &self,
        id: Uuid,
        prefs: &Preferences,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn insert_route(&self, route: NewRoute) -> Result<SavedRoute, StoreError>;
    async fn find_route(&self, id: Uuid) -> Result<Option<SavedRoute>, StoreError>;
    /// Public share read path: only matches routes flagged public.
    async fn find_route_by_share_token(
        &self,
        token: &str,
    ) -> Result<Option<SavedRoute>, StoreError>;
    /// Most recently used first.
    async fn list_routes_for_owner(&self, owner_id: Uuid) -> Result<Vec<SavedRoute>, StoreError>;
    async fn count_routes_for_owner(&self, owner_id: Uuid) -> Result<i64, StoreError>;
    async fn update_route(
        &self,
        id: Uuid,
        update: RouteUpdate,
    ) -> Result<Option<SavedRoute>, StoreError>;
    async fn delete_route(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn touch_last_used(&self, id: Uuid) -> Result<(), StoreError>;
    /// Attaches a share token and flips the route public in one write.
    /// Returns false when the id matches no route (deleted since the
    /// caller's existence check). Fails with `DuplicateShareToken` when
    /// another route already holds the token; the store's unique
    /// constraint is the authoritative guard.
    async fn attach_share_token(&self, id: Uuid, token: &str) -> Result<bool, StoreError>;
}

impl RouteUpdate {
    /// Applies this update to a route in place.
    pub(crate) fn apply(self, route: &mut SavedRoute) {
        if let Some(name) = self.name {
            route.name = name;
        }
        if let Some(origin) = self.origin {
            route.origin = origin;
        }
        if let Some(destination) = self.destination {
            route.destination = destination;
        }
        if let Some(waypoints) = self.waypoints {
            route.waypoints = waypoints;
        }
        if let Some(mode) = self.travel_mode {
            route.travel_mode = mode;
        }
        if let Some(distance) = self.distance {
            route.distance = Some(distance);
        }
        if let Some(duration) = self.duration {
            route.duration = Some(duration);
        }
        if let Some(data) = self.route_data {
            route.route_data = Some(data);
        }
        if let Some(tags) = self.tags {
            route.tags = tags;
        }
        if let Some(notes) = self.notes {
            route.notes = Some(notes);
        }
    }
}
