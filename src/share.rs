//! Share-link issuer. A share token is an unguessable 128-bit capability
//! rendered as 32 hex characters; holding it grants read access to one
//! public route, independent of identity.

use rand::RngCore;

use crate::errors::AppError;
use crate::models::route::SavedRoute;
use crate::store::{RouteStore, StoreError};

/// Attempts before giving up on a unique token. Collisions are vanishingly
/// rare at 128 bits; the bound exists so a broken store cannot spin us.
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Source of candidate share tokens. Injected so tests can script
/// collisions deterministically.
pub trait ShareTokenSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Production source: 16 random bytes, hex-encoded.
pub struct RandomTokenSource;

impl ShareTokenSource for RandomTokenSource {
    fn generate(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Returns the route's share token, generating one if it has none.
/// Idempotent: a route that already carries a token keeps it, and its
/// visibility is untouched. Otherwise the store write both attaches the
/// token and flips the route public; a uniqueness violation retries with
/// a fresh value up to [`MAX_GENERATION_ATTEMPTS`] times.
pub async fn ensure_share_token(
    routes: &dyn RouteStore,
    route: &SavedRoute,
    source: &dyn ShareTokenSource,
) -> Result<String, AppError> {
    if let Some(token) = &route.share_token {
        return Ok(token.clone());
    }

    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let token = source.generate();
        match routes.attach_share_token(route.id, &token).await {
            Ok(true) => return Ok(token),
            // Route deleted between the caller's existence check and the
            // write; nothing was persisted, so never hand out the token.
            Ok(false) => return Err(AppError::NotFound("route")),
            Err(StoreError::DuplicateShareToken) => {
                tracing::warn!(route_id = %route.id, "share token collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::CapabilityGenerationFailed)
}
