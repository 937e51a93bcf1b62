//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod event;
pub mod user;

pub use event::{AttendeeEntity, EventEntity, EventWithCountEntity};
pub use user::{UserEntity, UserSessionEntity};
