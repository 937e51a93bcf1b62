//! Profile of the authenticated user.

use axum::{extract::State, Json};
use domain::models::{EventResponse, EventWithCount, User, UserProfile};
use persistence::repositories::{EventRepository, UserRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;

/// GET /api/v1/users/me
///
/// The account together with every event it is enrolled in.
pub async fn get_current_user(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UserProfile>, ApiError> {
    let user: User = UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
        .into();

    let events = EventRepository::new(state.pool.clone())
        .events_for_user(user.id)
        .await?
        .into_iter()
        .map(|row| EventResponse::from(EventWithCount::from(row)).with_attendance(true))
        .collect();

    Ok(Json(UserProfile {
        user: user.into(),
        events,
    }))
}
