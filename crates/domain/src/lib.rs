//! Domain layer for the Certamen backend.
//!
//! This crate contains:
//! - Domain models (Event, Enrollment, User) and request/response DTOs
//! - Pure business rules (join decisions, write validation, occupancy)
//! - Domain error types
//! - The clock abstraction used to stamp publish dates

pub mod clock;
pub mod errors;
pub mod models;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{EventError, FieldConflict};
