use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::route::{SavedRoute, TravelMode};
use crate::models::user::{Preferences, User};
use crate::store::{NewRoute, NewUser, RouteStore, RouteUpdate, StoreError, UserStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(anyhow::Error::new(e))
}

/// Maps a unique-constraint violation to the given error, anything else
/// to a backend error.
fn map_unique(e: sqlx::Error, dup: StoreError) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return dup;
        }
    }
    backend(e)
}

// ── Row types ────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    preferences: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, StoreError> {
        let preferences: Preferences =
            serde_json::from_value(self.preferences).map_err(anyhow::Error::new)?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            preferences,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    origin: serde_json::Value,
    destination: serde_json::Value,
    waypoints: serde_json::Value,
    travel_mode: String,
    distance: Option<serde_json::Value>,
    duration: Option<serde_json::Value>,
    route_data: Option<serde_json::Value>,
    tags: Vec<String>,
    notes: Option<String>,
    is_public: bool,
    share_token: Option<String>,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
}

impl RouteRow {
    fn into_route(self) -> Result<SavedRoute, StoreError> {
        let travel_mode = TravelMode::parse(&self.travel_mode).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!(
                "unknown travel mode in store: {}",
                self.travel_mode
            ))
        })?;
        let distance = self
            .distance
            .map(serde_json::from_value)
            .transpose()
            .map_err(anyhow::Error::new)?;
        let duration = self
            .duration
            .map(serde_json::from_value)
            .transpose()
            .map_err(anyhow::Error::new)?;
        Ok(SavedRoute {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            origin: serde_json::from_value(self.origin).map_err(anyhow::Error::new)?,
            destination: serde_json::from_value(self.destination).map_err(anyhow::Error::new)?,
            waypoints: serde_json::from_value(self.waypoints).map_err(anyhow::Error::new)?,
            travel_mode,
            distance,
            duration,
            route_data: self.route_data,
            tags: self.tags,
            notes: self.notes,
            is_public: self.is_public,
            share_token: self.share_token,
            created_at: self.created_at,
            last_used: self.last_used,
        })
    }
}

const ROUTE_COLUMNS: &str = "id, owner_id, name, origin, destination, waypoints, travel_mode, \
     distance, duration, route_data, tags, notes, is_public, share_token, created_at, last_used";

// ── UserStore ────────────────────────────────────────────────

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let preferences = Preferences::default();
        let prefs_json = serde_json::to_value(&preferences).map_err(anyhow::Error::new)?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"INSERT INTO users (name, email, password_hash, preferences)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, email, password_hash, preferences, created_at"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(prefs_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, StoreError::DuplicateEmail))?;
        row.into_user()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, preferences, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, preferences, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"UPDATE users SET name = $2 WHERE id = $1
               RETURNING id, name, email, password_hash, preferences, created_at"#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn update_user_preferences(
        &self,
        id: Uuid,
        prefs: &Preferences,
    ) -> Result<Option<User>, StoreError> {
        let prefs_json = serde_json::to_value(prefs).map_err(anyhow::Error::new)?;
        let row = sqlx::query_as::<_, UserRow>(
            r#"UPDATE users SET preferences = $2 WHERE id = $1
               RETURNING id, name, email, password_hash, preferences, created_at"#,
        )
        .bind(id)
        .bind(prefs_json)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(UserRow::into_user).transpose()
    }
}

// ── RouteStore ───────────────────────────────────────────────

#[async_trait]
impl RouteStore for PgStore {
    async fn insert_route(&self, route: NewRoute) -> Result<SavedRoute, StoreError> {
        let origin = serde_json::to_value(&route.origin).map_err(anyhow::Error::new)?;
        let destination = serde_json::to_value(&route.destination).map_err(anyhow::Error::new)?;
        let waypoints = serde_json::to_value(&route.waypoints).map_err(anyhow::Error::new)?;
        let distance = route
            .distance
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::new)?;
        let duration = route
            .duration
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::new)?;

        let query = format!(
            r#"INSERT INTO routes (owner_id, name, origin, destination, waypoints, travel_mode,
                                   distance, duration, route_data, tags, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING {ROUTE_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, RouteRow>(&query)
            .bind(route.owner_id)
            .bind(&route.name)
            .bind(origin)
            .bind(destination)
            .bind(waypoints)
            .bind(route.travel_mode.as_str())
            .bind(distance)
            .bind(duration)
            .bind(&route.route_data)
            .bind(&route.tags)
            .bind(&route.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        row.into_route()
    }

    async fn find_route(&self, id: Uuid) -> Result<Option<SavedRoute>, StoreError> {
        let query = format!("SELECT {ROUTE_COLUMNS} FROM routes WHERE id = $1");
        let row = sqlx::query_as::<_, RouteRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(RouteRow::into_route).transpose()
    }

    async fn find_route_by_share_token(
        &self,
        token: &str,
    ) -> Result<Option<SavedRoute>, StoreError> {
        let query = format!(
            "SELECT {ROUTE_COLUMNS} FROM routes WHERE share_token = $1 AND is_public = TRUE"
        );
        let row = sqlx::query_as::<_, RouteRow>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(RouteRow::into_route).transpose()
    }

    async fn list_routes_for_owner(&self, owner_id: Uuid) -> Result<Vec<SavedRoute>, StoreError> {
        let query = format!(
            "SELECT {ROUTE_COLUMNS} FROM routes WHERE owner_id = $1 ORDER BY last_used DESC"
        );
        let rows = sqlx::query_as::<_, RouteRow>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.into_iter().map(RouteRow::into_route).collect()
    }

    async fn count_routes_for_owner(&self, owner_id: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM routes WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(count)
    }

    async fn update_route(
        &self,
        id: Uuid,
        update: RouteUpdate,
    ) -> Result<Option<SavedRoute>, StoreError> {
        // Read-modify-write: partial updates are applied in Rust so the
        // memory and Postgres stores share one merge semantics.
        let Some(mut route) = self.find_route(id).await? else {
            return Ok(None);
        };
        update.apply(&mut route);

        let origin = serde_json::to_value(&route.origin).map_err(anyhow::Error::new)?;
        let destination = serde_json::to_value(&route.destination).map_err(anyhow::Error::new)?;
        let waypoints = serde_json::to_value(&route.waypoints).map_err(anyhow::Error::new)?;
        let distance = route
            .distance
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::new)?;
        let duration = route
            .duration
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::new)?;

        sqlx::query(
            r#"UPDATE routes
               SET name = $2, origin = $3, destination = $4, waypoints = $5, travel_mode = $6,
                   distance = $7, duration = $8, route_data = $9, tags = $10, notes = $11
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(&route.name)
        .bind(origin)
        .bind(destination)
        .bind(waypoints)
        .bind(route.travel_mode.as_str())
        .bind(distance)
        .bind(duration)
        .bind(&route.route_data)
        .bind(&route.tags)
        .bind(&route.notes)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(Some(route))
    }

    async fn delete_route(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE routes SET last_used = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn attach_share_token(&self, id: Uuid, token: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE routes SET share_token = $2, is_public = TRUE WHERE id = $1")
                .bind(id)
                .bind(token)
                .execute(&self.pool)
                .await
                .map_err(|e| map_unique(e, StoreError::DuplicateShareToken))?;
        Ok(result.rows_affected() > 0)
    }
}
