//! Application services used by route handlers and startup.

pub mod admin_bootstrap;
pub mod auth;

pub use admin_bootstrap::{bootstrap_admin, BootstrapError, BootstrapOutcome};
pub use auth::{AuthError, AuthResult, AuthService, Registration};
