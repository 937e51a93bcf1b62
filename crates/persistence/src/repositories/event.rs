//! Event repository: catalogue reads, administrative writes and enrollment.
//!
//! Locking rules:
//! - join and capacity-changing updates hold the event row lock
//!   (`SELECT ... FOR UPDATE`) for their whole transaction;
//! - every write that sets `is_featured` first takes a transaction-scoped
//!   advisory lock, then clears the flag on all other events;
//! - leave and all reads take no explicit lock.

use chrono::{DateTime, NaiveDate, Utc};
use domain::errors::EventError;
use domain::models::{EventDraft, JoinOutcome, LeaveOutcome};
use domain::services::{capacity_conflict, decide_join, FeaturedHolder, JoinDecision, WriteContext};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::entities::{AttendeeEntity, EventEntity, EventWithCountEntity};
use crate::metrics::QueryTimer;

/// Advisory lock key serializing writes that set `is_featured`.
const FEATURED_LOCK_KEY: i64 = 0x4345_5254_4645_4154;

macro_rules! event_columns {
    () => {
        "e.id, e.name, e.pub_date, e.event_date, e.starts_at, e.ends_at, e.location, \
         e.description, e.price, e.capacity, e.is_featured, e.image_base64, \
         e.created_at, e.updated_at"
    };
}

macro_rules! select_with_count {
    () => {
        concat!(
            "SELECT ",
            event_columns!(),
            ", (SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id) AS attendees_count \
             FROM events e"
        )
    };
}

/// Filters of the administrative listing.
#[derive(Debug, Clone, Default)]
pub struct AdminEventFilter<'a> {
    /// Substring matched against name, location and description.
    pub search: Option<&'a str>,
    pub is_featured: Option<bool>,
    pub location: Option<&'a str>,
    pub event_date_from: Option<NaiveDate>,
    pub event_date_to: Option<NaiveDate>,
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All events ordered by event date.
    pub async fn list_events(&self) -> Result<Vec<EventWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_events");
        let result = sqlx::query_as::<_, EventWithCountEntity>(concat!(
            select_with_count!(),
            " ORDER BY e.event_date ASC, e.starts_at ASC, e.id ASC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The featured event, if any.
    pub async fn find_featured(&self) -> Result<Option<EventWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_featured_event");
        let result = sqlx::query_as::<_, EventWithCountEntity>(concat!(
            select_with_count!(),
            " WHERE e.is_featured LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an event with its attendee count.
    pub async fn find_with_count(
        &self,
        event_id: i64,
    ) -> Result<Option<EventWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_with_count");
        let result = fetch_with_count(&self.pool, event_id).await;
        timer.record();
        result
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, event_id: i64) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(concat!(
            "SELECT ",
            event_columns!(),
            " FROM events e WHERE e.id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether the user is enrolled in the event.
    pub async fn is_attending(&self, event_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("is_attending_event");
        let result = is_enrolled(&self.pool, event_id, user_id).await;
        timer.record();
        result
    }

    /// Events the user is enrolled in, ordered by event date.
    pub async fn events_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<EventWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("events_for_user");
        let result = sqlx::query_as::<_, EventWithCountEntity>(concat!(
            select_with_count!(),
            " WHERE EXISTS (SELECT 1 FROM event_attendees me \
               WHERE me.event_id = e.id AND me.user_id = $1) \
             ORDER BY e.event_date ASC, e.starts_at ASC, e.id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Administrative search, newest event date first.
    ///
    /// Returns the requested page and the total number of matches.
    pub async fn admin_search(
        &self,
        filter: &AdminEventFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<EventWithCountEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("admin_search_events");
        let pattern = filter.search.map(|term| format!("%{}%", escape_like(term)));

        let rows = sqlx::query_as::<_, EventWithCountEntity>(concat!(
            select_with_count!(),
            " WHERE ($1::text IS NULL OR e.name ILIKE $1 OR e.location ILIKE $1 OR e.description ILIKE $1)
              AND ($2::boolean IS NULL OR e.is_featured = $2)
              AND ($3::text IS NULL OR e.location = $3)
              AND ($4::date IS NULL OR e.event_date >= $4)
              AND ($5::date IS NULL OR e.event_date <= $5)
             ORDER BY e.event_date DESC, e.starts_at ASC, e.id DESC
             LIMIT $6 OFFSET $7"
        ))
        .bind(pattern.as_deref())
        .bind(filter.is_featured)
        .bind(filter.location)
        .bind(filter.event_date_from)
        .bind(filter.event_date_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM events e
            WHERE ($1::text IS NULL OR e.name ILIKE $1 OR e.location ILIKE $1 OR e.description ILIKE $1)
              AND ($2::boolean IS NULL OR e.is_featured = $2)
              AND ($3::text IS NULL OR e.location = $3)
              AND ($4::date IS NULL OR e.event_date >= $4)
              AND ($5::date IS NULL OR e.event_date <= $5)
            "#,
        )
        .bind(pattern.as_deref())
        .bind(filter.is_featured)
        .bind(filter.location)
        .bind(filter.event_date_from)
        .bind(filter.event_date_to)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok((rows, total.0))
    }

    /// Users enrolled in the event, earliest first.
    pub async fn list_attendees(&self, event_id: i64) -> Result<Vec<AttendeeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_attendees");
        let result = sqlx::query_as::<_, AttendeeEntity>(
            r#"
            SELECT u.id AS user_id, u.username, u.first_name, u.last_name, u.email, a.joined_at
            FROM event_attendees a
            JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1
            ORDER BY a.joined_at ASC, u.id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Loads the store state the advisory write validation runs against.
    pub async fn load_write_context(
        &self,
        event_id: Option<i64>,
    ) -> Result<WriteContext, sqlx::Error> {
        let timer = QueryTimer::new("load_event_write_context");
        let featured: Option<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM events WHERE is_featured LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        let featured = featured.map(|(id, name)| FeaturedHolder { id, name });

        let ctx = match event_id {
            Some(id) => {
                let count = count_attendees(&self.pool, id).await?;
                WriteContext::for_update(id, count, featured)
            }
            None => WriteContext::for_create(featured),
        };
        timer.record();
        Ok(ctx)
    }

    /// Inserts an event.
    ///
    /// When the draft is featured, every other event is unfeatured in the same
    /// transaction.
    pub async fn create_event(
        &self,
        draft: &EventDraft,
        pub_date: DateTime<Utc>,
    ) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let mut tx = self.pool.begin().await?;

        if draft.is_featured {
            lock_featured(&mut tx).await?;
            clear_other_featured(&mut tx, None).await?;
        }

        let entity = sqlx::query_as::<_, EventEntity>(concat!(
            "INSERT INTO events AS e (name, pub_date, event_date, starts_at, ends_at, location, \
             description, price, capacity, is_featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING ",
            event_columns!()
        ))
        .bind(&draft.name)
        .bind(pub_date)
        .bind(draft.event_date)
        .bind(draft.starts_at)
        .bind(draft.ends_at)
        .bind(&draft.location)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.capacity)
        .bind(draft.is_featured)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Saves an edited event.
    ///
    /// The event row is locked before the capacity is compared against the
    /// attendee count, so a concurrent join cannot slip in between the check
    /// and the write.
    pub async fn update_event(
        &self,
        event_id: i64,
        draft: &EventDraft,
    ) -> Result<EventEntity, EventError> {
        let timer = QueryTimer::new("update_event");
        let mut tx = self.pool.begin().await?;

        if draft.is_featured {
            lock_featured(&mut tx).await?;
        }
        if !lock_event_row(&mut tx, event_id).await? {
            return Err(EventError::NotFound(event_id));
        }

        let attendees = count_attendees(&mut *tx, event_id).await?;
        if let Some(conflict) = capacity_conflict(draft.capacity, attendees) {
            return Err(EventError::ValidationConflict(vec![conflict]));
        }

        if draft.is_featured {
            clear_other_featured(&mut tx, Some(event_id)).await?;
        }

        let entity = sqlx::query_as::<_, EventEntity>(concat!(
            "UPDATE events AS e SET name = $2, event_date = $3, starts_at = $4, ends_at = $5, \
             location = $6, description = $7, price = $8, capacity = $9, is_featured = $10 \
             WHERE e.id = $1 RETURNING ",
            event_columns!()
        ))
        .bind(event_id)
        .bind(&draft.name)
        .bind(draft.event_date)
        .bind(draft.starts_at)
        .bind(draft.ends_at)
        .bind(&draft.location)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.capacity)
        .bind(draft.is_featured)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity)
    }

    /// Deletes an event; enrollments cascade.
    pub async fn delete_event(&self, event_id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_event");
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Features an event directly, unfeaturing whichever event held the flag.
    ///
    /// Returns the featured event and the ID of the previous holder.
    pub async fn feature_event(
        &self,
        event_id: i64,
    ) -> Result<(EventEntity, Option<i64>), EventError> {
        let timer = QueryTimer::new("feature_event");
        let mut tx = self.pool.begin().await?;

        lock_featured(&mut tx).await?;
        if !lock_event_row(&mut tx, event_id).await? {
            return Err(EventError::NotFound(event_id));
        }

        let previous = clear_other_featured(&mut tx, Some(event_id))
            .await?
            .into_iter()
            .next();

        let entity = sqlx::query_as::<_, EventEntity>(concat!(
            "UPDATE events AS e SET is_featured = TRUE WHERE e.id = $1 RETURNING ",
            event_columns!()
        ))
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        debug!(event_id, previously_featured = ?previous, "Featured flag moved");
        Ok((entity, previous))
    }

    /// Replaces or clears the event image.
    pub async fn set_image(
        &self,
        event_id: i64,
        image_base64: Option<&str>,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_event_image");
        let result = sqlx::query_as::<_, EventEntity>(concat!(
            "UPDATE events AS e SET image_base64 = $2 WHERE e.id = $1 RETURNING ",
            event_columns!()
        ))
        .bind(event_id)
        .bind(image_base64)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Enrolls a user in an event.
    ///
    /// Concurrent joins on the same event are serialized by the row lock, so
    /// at most `capacity` enrollments ever persist.
    pub async fn join_event(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<(EventWithCountEntity, JoinOutcome), EventError> {
        let timer = QueryTimer::new("join_event");
        let mut tx = self.pool.begin().await?;

        let capacity: Option<(Option<i32>,)> =
            sqlx::query_as("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((capacity,)) = capacity else {
            return Err(EventError::NotFound(event_id));
        };

        let already_enrolled = is_enrolled(&mut *tx, event_id, user_id).await?;
        let attendees = count_attendees(&mut *tx, event_id).await?;

        // Dropping `tx` on error rolls back and releases the lock.
        let outcome = match decide_join(event_id, capacity, attendees, already_enrolled)? {
            JoinDecision::AlreadyEnrolled => JoinOutcome::AlreadyEnrolled,
            JoinDecision::Enroll => {
                sqlx::query("INSERT INTO event_attendees (event_id, user_id) VALUES ($1, $2)")
                    .bind(event_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                JoinOutcome::Joined
            }
        };

        let state = fetch_with_count(&mut *tx, event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;

        tx.commit().await?;
        timer.record();
        debug!(event_id, user_id, outcome = outcome.as_str(), "Join committed");
        Ok((state, outcome))
    }

    /// Removes a user from an event. Not being enrolled is not an error.
    pub async fn leave_event(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<(EventWithCountEntity, LeaveOutcome), EventError> {
        let timer = QueryTimer::new("leave_event");

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(EventError::NotFound(event_id));
        }

        let result = sqlx::query("DELETE FROM event_attendees WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        let outcome = if result.rows_affected() > 0 {
            LeaveOutcome::Left
        } else {
            LeaveOutcome::NotEnrolled
        };

        // The event may have been deleted in between.
        let state = fetch_with_count(&self.pool, event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;
        timer.record();
        Ok((state, outcome))
    }
}

async fn fetch_with_count<'e, E>(
    executor: E,
    event_id: i64,
) -> Result<Option<EventWithCountEntity>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, EventWithCountEntity>(concat!(select_with_count!(), " WHERE e.id = $1"))
        .bind(event_id)
        .fetch_optional(executor)
        .await
}

async fn is_enrolled<'e, E>(executor: E, event_id: i64, user_id: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM event_attendees WHERE event_id = $1 AND user_id = $2)",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}

async fn count_attendees<'e, E>(executor: E, event_id: i64) -> Result<i64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_attendees WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

/// Takes the event row lock; `false` if the event does not exist.
async fn lock_event_row(conn: &mut PgConnection, event_id: i64) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

async fn lock_featured(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(FEATURED_LOCK_KEY)
        .execute(conn)
        .await?;
    Ok(())
}

/// Unfeatures every event except `keep`; returns the IDs that changed.
async fn clear_other_featured(
    conn: &mut PgConnection,
    keep: Option<i64>,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        UPDATE events
        SET is_featured = FALSE
        WHERE is_featured AND ($1::bigint IS NULL OR id <> $1)
        RETURNING id
        "#,
    )
    .bind(keep)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Escapes `%`, `_` and `\` for use inside an ILIKE pattern.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
