//! Per-route authorization. Callers must check existence first (missing
//! routes are 404 before any ownership question is asked).

use crate::errors::AppError;
use crate::models::route::SavedRoute;
use crate::models::user::User;

/// A route is viewable by its owner, or by anyone once it is public.
pub fn can_view(route: &SavedRoute, user: &User) -> bool {
    route.owner_id == user.id || route.is_public
}

/// Update, delete, and share are owner-only.
pub fn can_mutate(route: &SavedRoute, user: &User) -> bool {
    route.owner_id == user.id
}

pub fn require_view(route: &SavedRoute, user: &User) -> Result<(), AppError> {
    if can_view(route, user) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "not authorized to view this route".to_string(),
        ))
    }
}

/// `action` names the attempted mutation ("update", "delete", "share")
/// for the error message.
pub fn require_mutate(route: &SavedRoute, user: &User, action: &str) -> Result<(), AppError> {
    if can_mutate(route, user) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "not authorized to {} this route",
            action
        )))
    }
}
