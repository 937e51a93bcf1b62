//! Domain services for Certamen.
//!
//! Services contain business logic that operates on domain models.

pub mod enrollment;
pub mod event_rules;

pub use enrollment::{decide_join, JoinDecision};
pub use event_rules::{capacity_conflict, validate_event_write, FeaturedHolder, WriteContext};
