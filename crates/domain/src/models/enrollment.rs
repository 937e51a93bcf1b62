//! Enrollment (event attendance) domain models.

use serde::Serialize;

use super::event::{Event, EventResponse, EventWithCount};

/// Result of a successful join call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    Joined,
    /// The caller was already enrolled; nothing changed.
    AlreadyEnrolled,
}

impl JoinOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinOutcome::Joined => "joined",
            JoinOutcome::AlreadyEnrolled => "already_enrolled",
        }
    }

    pub fn message(&self, event: &Event) -> String {
        match self {
            JoinOutcome::Joined => format!(
                "You have successfully joined \"{}\"! See you on {} at {}.",
                event.name,
                event.event_date.format("%d/%m/%Y"),
                event.starts_at.format("%H:%M")
            ),
            JoinOutcome::AlreadyEnrolled => {
                format!("You are already enrolled in \"{}\".", event.name)
            }
        }
    }
}

/// Result of a successful leave call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOutcome {
    Left,
    /// The caller was never enrolled; informational only.
    NotEnrolled,
}

impl LeaveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveOutcome::Left => "left",
            LeaveOutcome::NotEnrolled => "not_enrolled",
        }
    }

    pub fn message(&self, event: &Event) -> String {
        match self {
            LeaveOutcome::Left => format!("You have left \"{}\".", event.name),
            LeaveOutcome::NotEnrolled => {
                format!("You were not enrolled in \"{}\".", event.name)
            }
        }
    }
}

/// Response body of `POST /events/{id}/join`.
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub outcome: JoinOutcome,
    pub message: String,
    pub event: EventResponse,
}

impl JoinResponse {
    pub fn new(outcome: JoinOutcome, row: EventWithCount) -> Self {
        let message = outcome.message(&row.event);
        Self {
            outcome,
            message,
            event: EventResponse::from(row).with_attendance(true),
        }
    }
}

/// Response body of `POST /events/{id}/leave`.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub outcome: LeaveOutcome,
    pub message: String,
    pub event: EventResponse,
}

impl LeaveResponse {
    pub fn new(outcome: LeaveOutcome, row: EventWithCount) -> Self {
        let message = outcome.message(&row.event);
        Self {
            outcome,
            message,
            event: EventResponse::from(row).with_attendance(false),
        }
    }
}
