//! HTTP route handlers.

pub mod admin_events;
pub mod auth;
pub mod events;
pub mod health;
pub mod users;
