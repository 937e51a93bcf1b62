//! Repository implementations for database operations.

pub mod event;
pub mod user;

pub use event::{AdminEventFilter, EventRepository};
pub use user::{NewUser, UserRepository};
