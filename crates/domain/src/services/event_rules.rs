//! Validation of administrative event writes.
//!
//! [`validate_event_write`] is a pure check over a context loaded from the
//! store just before the save. It gives early, per-field feedback; the save
//! step in the repository re-establishes both invariants inside its own
//! transaction.

use crate::errors::FieldConflict;
use crate::models::EventDraft;

/// The event currently holding featured status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturedHolder {
    pub id: i64,
    pub name: String,
}

/// Store state the validation runs against.
#[derive(Debug, Clone, Default)]
pub struct WriteContext {
    /// `None` when creating.
    pub event_id: Option<i64>,
    pub attendee_count: i64,
    pub featured: Option<FeaturedHolder>,
}

impl WriteContext {
    pub fn for_create(featured: Option<FeaturedHolder>) -> Self {
        Self {
            event_id: None,
            attendee_count: 0,
            featured,
        }
    }

    pub fn for_update(event_id: i64, attendee_count: i64, featured: Option<FeaturedHolder>) -> Self {
        Self {
            event_id: Some(event_id),
            attendee_count,
            featured,
        }
    }
}

/// Rejects a capacity below the current number of attendees.
pub fn capacity_conflict(capacity: Option<i32>, attendee_count: i64) -> Option<FieldConflict> {
    match capacity {
        Some(cap) if attendee_count > 0 && i64::from(cap) < attendee_count => {
            Some(FieldConflict::new(
                "capacity",
                format!(
                    "Capacity cannot be less than the current number of attendees ({})",
                    attendee_count
                ),
            ))
        }
        _ => None,
    }
}

/// Validates a create or update before it is saved.
///
/// Returns every conflict found, not only the first.
pub fn validate_event_write(
    draft: &EventDraft,
    ctx: &WriteContext,
) -> Result<(), Vec<FieldConflict>> {
    let mut conflicts = Vec::new();

    if draft.price < 0 {
        conflicts.push(FieldConflict::new("price", "Price cannot be negative"));
    }

    match draft.capacity {
        Some(cap) if cap < 0 => {
            conflicts.push(FieldConflict::new("capacity", "Capacity cannot be negative"));
        }
        capacity => {
            // Only persisted events can have attendees.
            if ctx.event_id.is_some() {
                conflicts.extend(capacity_conflict(capacity, ctx.attendee_count));
            }
        }
    }

    if draft.is_featured {
        if let Some(holder) = &ctx.featured {
            if Some(holder.id) != ctx.event_id {
                conflicts.push(FieldConflict::new(
                    "is_featured",
                    format!(
                        "\"{}\" is already featured. Unfeature it first or use the feature action",
                        holder.name
                    ),
                ));
            }
        }
    }

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(conflicts)
    }
}
