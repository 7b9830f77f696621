use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved route. Owned by exactly one account; visible to others only
/// when `is_public` is set. A route carrying a share token is public by
/// construction (issuing the token flips the flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRoute {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub origin: Place,
    pub destination: Place,
    pub waypoints: Vec<Waypoint>,
    pub travel_mode: TravelMode,
    pub distance: Option<Measure>,
    pub duration: Option<Measure>,
    /// Raw response from the mapping provider, stored opaquely so the
    /// client can re-render without refetching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_data: Option<serde_json::Value>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

/// A geocoded endpoint of a route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub order: i32,
}

/// Distance or duration as reported by the provider: human-readable text
/// plus the raw value (meters / seconds).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measure {
    pub text: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "DRIVING",
            TravelMode::Walking => "WALKING",
            TravelMode::Bicycling => "BICYCLING",
            TravelMode::Transit => "TRANSIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRIVING" => Some(TravelMode::Driving),
            "WALKING" => Some(TravelMode::Walking),
            "BICYCLING" => Some(TravelMode::Bicycling),
            "TRANSIT" => Some(TravelMode::Transit),
            _ => None,
        }
    }
}
