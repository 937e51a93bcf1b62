//! Join decision logic.
//!
//! The caller must hold the event row lock while evaluating and acting on the
//! decision, otherwise two joins can both observe a free slot.

use crate::errors::EventError;

/// What a join call should do once the event row is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    /// Insert the association.
    Enroll,
    /// Already enrolled; succeed without writing.
    AlreadyEnrolled,
}

/// Decides a join against the locked event state.
///
/// An existing enrollment always wins over the capacity check, so a repeated
/// join on a full event is still a success.
pub fn decide_join(
    event_id: i64,
    capacity: Option<i32>,
    attendee_count: i64,
    already_enrolled: bool,
) -> Result<JoinDecision, EventError> {
    if already_enrolled {
        return Ok(JoinDecision::AlreadyEnrolled);
    }

    match capacity {
        Some(cap) if attendee_count >= i64::from(cap) => Err(EventError::CapacityExceeded {
            event_id,
            capacity: cap,
        }),
        _ => Ok(JoinDecision::Enroll),
    }
}
