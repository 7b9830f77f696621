//! In-memory store backing the integration tests and local hacking.
//! Same semantics as the Postgres store, including the unique-constraint
//! failures the share issuer relies on.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::route::SavedRoute;
use crate::models::user::{Preferences, User};
use crate::store::{NewRoute, NewUser, RouteStore, RouteUpdate, StoreError, UserStore};

#[derive(Default)]
pub struct MemStore {
    users: Mutex<HashMap<Uuid, User>>,
    routes: Mutex<HashMap<Uuid, SavedRoute>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            preferences: Preferences::default(),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&id).map(|u| {
            u.name = name.to_string();
            u.clone()
        }))
    }

    async fn update_user_preferences(
        &self,
        id: Uuid,
        prefs: &Preferences,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&id).map(|u| {
            u.preferences = prefs.clone();
            u.clone()
        }))
    }
}

#[async_trait]
impl RouteStore for MemStore {
    async fn insert_route(&self, route: NewRoute) -> Result<SavedRoute, StoreError> {
        let now = Utc::now();
        let route = SavedRoute {
            id: Uuid::new_v4(),
            owner_id: route.owner_id,
            name: route.name,
            origin: route.origin,
            destination: route.destination,
            waypoints: route.waypoints,
            travel_mode: route.travel_mode,
            distance: route.distance,
            duration: route.duration,
            route_data: route.route_data,
            tags: route.tags,
            notes: route.notes,
            is_public: false,
            share_token: None,
            created_at: now,
            last_used: now,
        };
        self.routes.lock().unwrap().insert(route.id, route.clone());
        Ok(route)
    }

    async fn find_route(&self, id: Uuid) -> Result<Option<SavedRoute>, StoreError> {
        Ok(self.routes.lock().unwrap().get(&id).cloned())
    }

    async fn find_route_by_share_token(
        &self,
        token: &str,
    ) -> Result<Option<SavedRoute>, StoreError> {
        Ok(self
            .routes
            .lock()
            .unwrap()
            .values()
            .find(|r| r.is_public && r.share_token.as_deref() == Some(token))
            .cloned())
    }

    async fn list_routes_for_owner(&self, owner_id: Uuid) -> Result<Vec<SavedRoute>, StoreError> {
        let mut routes: Vec<SavedRoute> = self
            .routes
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        routes.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        Ok(routes)
    }

    async fn count_routes_for_owner(&self, owner_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .routes
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.owner_id == owner_id)
            .count() as i64)
    }

    async fn update_route(
        &self,
        id: Uuid,
        update: RouteUpdate,
    ) -> Result<Option<SavedRoute>, StoreError> {
        let mut routes = self.routes.lock().unwrap();
        Ok(routes.get_mut(&id).map(|r| {
            update.apply(r);
            r.clone()
        }))
    }

    async fn delete_route(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.routes.lock().unwrap().remove(&id).is_some())
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(r) = self.routes.lock().unwrap().get_mut(&id) {
            r.last_used = Utc::now();
        }
        Ok(())
    }

    async fn attach_share_token(&self, id: Uuid, token: &str) -> Result<bool, StoreError> {
        let mut routes = self.routes.lock().unwrap();
        if routes
            .values()
            .any(|r| r.id != id && r.share_token.as_deref() == Some(token))
        {
            return Err(StoreError::DuplicateShareToken);
        }
        match routes.get_mut(&id) {
            Some(r) => {
                r.share_token = Some(token.to_string());
                r.is_public = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
