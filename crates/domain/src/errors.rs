//! Domain error taxonomy for event operations.

use serde::Serialize;
use thiserror::Error;

/// A single rejected field, reported back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConflict {
    pub field: String,
    pub message: String,
}

impl FieldConflict {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the event store and the enrollment service.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event {0} not found")]
    NotFound(i64),

    #[error("No slots remaining for event {event_id} (capacity {capacity})")]
    CapacityExceeded { event_id: i64, capacity: i32 },

    #[error("Validation failed: {}", summarize(.0))]
    ValidationConflict(Vec<FieldConflict>),

    /// Store failure: lock wait, deadlock, lost connection. Not retried here.
    #[error("Transient store failure: {0}")]
    Transient(#[from] sqlx::Error),
}

fn summarize(conflicts: &[FieldConflict]) -> String {
    conflicts
        .iter()
        .map(|c| format!("{}: {}", c.field, c.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<FieldConflict>> for EventError {
    fn from(conflicts: Vec<FieldConflict>) -> Self {
        EventError::ValidationConflict(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_exceeded_display() {
        let err = EventError::CapacityExceeded {
            event_id: 7,
            capacity: 2,
        };
        assert_eq!(
            err.to_string(),
            "No slots remaining for event 7 (capacity 2)"
        );
    }

    #[test]
    fn test_validation_conflict_display_lists_fields() {
        let err = EventError::from(vec![
            FieldConflict::new("capacity", "too low"),
            FieldConflict::new("is_featured", "taken"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: capacity: too low; is_featured: taken"
        );
    }

    #[test]
    fn test_transient_from_sqlx() {
        let err: EventError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, EventError::Transient(_)));
    }
}
