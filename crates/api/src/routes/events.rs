//! Public event catalogue and enrollment routes.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::errors::EventError;
use domain::models::{
    EventResponse, EventWithCount, FeaturedEventResponse, JoinOutcome, JoinResponse,
    LeaveOutcome, LeaveResponse, ListEventsResponse,
};
use persistence::repositories::EventRepository;
use tracing::{debug, info};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OptionalUserAuth;
use crate::middleware::metrics::{record_join, record_join_outcome, record_leave};
use crate::middleware::UserAuth;

/// GET /api/v1/events
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let data = repo
        .list_events()
        .await?
        .into_iter()
        .map(|row| EventResponse::from(EventWithCount::from(row)))
        .collect();

    Ok(Json(ListEventsResponse { data }))
}

/// GET /api/v1/events/featured
pub async fn featured_event(
    State(state): State<AppState>,
) -> Result<Json<FeaturedEventResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let event = repo
        .find_featured()
        .await?
        .map(|row| EventResponse::from(EventWithCount::from(row)));

    Ok(Json(FeaturedEventResponse { event }))
}

/// GET /api/v1/events/:event_id
///
/// Authenticated callers also get `is_attending`.
pub async fn get_event(
    State(state): State<AppState>,
    OptionalUserAuth(auth): OptionalUserAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let row = repo
        .find_with_count(event_id)
        .await?
        .ok_or(EventError::NotFound(event_id))?;

    let mut response = EventResponse::from(EventWithCount::from(row));
    if let Some(auth) = auth {
        let attending = repo.is_attending(event_id, auth.user_id).await?;
        response = response.with_attendance(attending);
    }

    Ok(Json(response))
}

/// POST /api/v1/events/:event_id/join
pub async fn join_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<JoinResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());

    let (row, outcome) = match repo.join_event(event_id, auth.user_id).await {
        Ok(joined) => joined,
        Err(err) => {
            if matches!(err, EventError::CapacityExceeded { .. }) {
                record_join("capacity_exceeded");
                info!(event_id, user_id = auth.user_id, "Join rejected, event is full");
            }
            return Err(err.into());
        }
    };

    record_join_outcome(outcome);
    match outcome {
        JoinOutcome::Joined => info!(event_id, user_id = auth.user_id, "User joined event"),
        JoinOutcome::AlreadyEnrolled => {
            debug!(event_id, user_id = auth.user_id, "Join ignored, already enrolled")
        }
    }

    Ok(Json(JoinResponse::new(outcome, row.into())))
}

/// POST /api/v1/events/:event_id/leave
pub async fn leave_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let (row, outcome) = repo.leave_event(event_id, auth.user_id).await?;

    record_leave(outcome);
    match outcome {
        LeaveOutcome::Left => info!(event_id, user_id = auth.user_id, "User left event"),
        LeaveOutcome::NotEnrolled => {
            debug!(event_id, user_id = auth.user_id, "Leave ignored, not enrolled")
        }
    }

    Ok(Json(LeaveResponse::new(outcome, row.into())))
}
