//! Administrative event management.
//!
//! Creates and edits go through two steps: [`validate_event_write`] against a
//! freshly loaded context for per-field feedback, then the repository save,
//! which re-establishes the featured and capacity invariants in its own
//! transaction.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use domain::errors::EventError;
use domain::models::{
    AdminEventDetail, AdminEventListQuery, AdminEventListResponse, AdminEventRow, AttendeeInfo,
    CreateEventRequest, Event, EventResponse, EventWithCount, FeatureEventResponse, Pagination,
    UpdateEventRequest,
};
use domain::services::validate_event_write;
use persistence::repositories::{AdminEventFilter, EventRepository};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AdminUser;

/// GET /api/v1/admin/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<AdminEventListQuery>,
) -> Result<Json<AdminEventListResponse>, ApiError> {
    let page = query.page();
    let per_page = query.per_page(state.config.limits.admin_page_size);
    let filter = AdminEventFilter {
        search: query.search_term(),
        is_featured: query.is_featured,
        location: query
            .location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty()),
        event_date_from: query.event_date_from,
        event_date_to: query.event_date_to,
    };

    let limit = i64::from(per_page);
    let offset = i64::from(page - 1) * limit;

    let (rows, total) = EventRepository::new(state.pool.clone())
        .admin_search(&filter, limit, offset)
        .await?;

    let data = rows
        .into_iter()
        .map(|row| AdminEventRow::from(EventWithCount::from(row)))
        .collect();

    Ok(Json(AdminEventListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// POST /api/v1/admin/events
///
/// The publish date is stamped from the application clock.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<AdminEventDetail>), ApiError> {
    request.validate()?;
    let draft = request.into_draft();

    let repo = EventRepository::new(state.pool.clone());
    let ctx = repo.load_write_context(None).await?;
    validate_event_write(&draft, &ctx).map_err(EventError::from)?;

    let entity = repo.create_event(&draft, state.clock.now()).await?;
    info!(
        event_id = entity.id,
        admin_id = admin.user_id,
        is_featured = entity.is_featured,
        "Event created"
    );

    let row = EventWithCount {
        event: entity.into(),
        attendees_count: 0,
    };
    Ok((StatusCode::CREATED, Json(AdminEventDetail::new(row, Vec::new()))))
}

/// GET /api/v1/admin/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<AdminEventDetail>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    Ok(Json(load_detail(&repo, event_id).await?))
}

/// PUT /api/v1/admin/events/:event_id
///
/// Partial edit: absent fields keep their stored value.
pub async fn update_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(event_id): Path<i64>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<AdminEventDetail>, ApiError> {
    request.validate()?;

    let repo = EventRepository::new(state.pool.clone());
    let current: Event = repo
        .find_by_id(event_id)
        .await?
        .ok_or(EventError::NotFound(event_id))?
        .into();
    let draft = request.apply_to(&current);

    let ctx = repo.load_write_context(Some(event_id)).await?;
    validate_event_write(&draft, &ctx).map_err(EventError::from)?;

    let entity = repo.update_event(event_id, &draft).await?;
    info!(
        event_id,
        admin_id = admin.user_id,
        capacity = ?entity.capacity,
        is_featured = entity.is_featured,
        "Event updated"
    );

    Ok(Json(load_detail(&repo, event_id).await?))
}

/// DELETE /api/v1/admin/events/:event_id
///
/// Enrollments are removed with the event.
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(event_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = EventRepository::new(state.pool.clone())
        .delete_event(event_id)
        .await?;
    if !deleted {
        return Err(EventError::NotFound(event_id).into());
    }

    info!(event_id, admin_id = admin.user_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/events/:event_id/feature
///
/// Takes featured status from whichever event holds it, without the
/// advisory conflict check, and reports the previous holder.
pub async fn feature_event(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(event_id): Path<i64>,
) -> Result<Json<FeatureEventResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let (_, previously_featured_id) = repo.feature_event(event_id).await?;

    if let Some(previous) = previously_featured_id {
        info!(
            event_id,
            previous_event_id = previous,
            admin_id = admin.user_id,
            "Featured status moved to event"
        );
    }

    let row = repo
        .find_with_count(event_id)
        .await?
        .ok_or(EventError::NotFound(event_id))?;

    Ok(Json(FeatureEventResponse {
        event: EventWithCount::from(row).into(),
        previously_featured_id,
    }))
}

/// PUT /api/v1/admin/events/:event_id/image
///
/// Raw image body; stored as a base64 data URL.
pub async fn set_image(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EventResponse>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let data_url =
        shared::image::encode_data_url(content_type, &body, state.config.limits.max_image_bytes)?;

    let repo = EventRepository::new(state.pool.clone());
    repo.set_image(event_id, Some(&data_url))
        .await?
        .ok_or(EventError::NotFound(event_id))?;
    info!(event_id, bytes = body.len(), "Event image replaced");

    event_response(&repo, event_id).await.map(Json)
}

/// DELETE /api/v1/admin/events/:event_id/image
pub async fn clear_image(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    repo.set_image(event_id, None)
        .await?
        .ok_or(EventError::NotFound(event_id))?;

    event_response(&repo, event_id).await.map(Json)
}

async fn event_response(repo: &EventRepository, event_id: i64) -> Result<EventResponse, ApiError> {
    let row = repo
        .find_with_count(event_id)
        .await?
        .ok_or(EventError::NotFound(event_id))?;
    Ok(EventWithCount::from(row).into())
}

async fn load_detail(repo: &EventRepository, event_id: i64) -> Result<AdminEventDetail, ApiError> {
    let row = repo
        .find_with_count(event_id)
        .await?
        .ok_or(EventError::NotFound(event_id))?;
    let attendees: Vec<AttendeeInfo> = repo
        .list_attendees(event_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(AdminEventDetail::new(row.into(), attendees))
}
