//! Periodic maintenance tasks run alongside the HTTP server.

mod rate_limit_prune;
mod scheduler;
mod session_cleanup;

pub use rate_limit_prune::RateLimitPruneJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use session_cleanup::SessionCleanupJob;
