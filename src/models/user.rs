use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::route::TravelMode;

/// A registered account. The password hash is an argon2 PHC string and is
/// never serialized into API responses.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

/// Per-account routing preferences, stored as a single JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub default_travel_mode: TravelMode,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_travel_mode: TravelMode::Driving,
            avoid_tolls: false,
            avoid_highways: false,
            dark_mode: false,
        }
    }
}
