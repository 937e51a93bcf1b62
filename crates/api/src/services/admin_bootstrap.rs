//! Creates the first administrator on startup.
//!
//! Runs after migrations when `admin.bootstrap_username` is set. Idempotent:
//! an existing account with that username is promoted instead of recreated.

use persistence::repositories::{NewUser, UserRepository};
use shared::password::{hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// What the bootstrap did, mainly for tests and the startup log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NotConfigured,
    Created(i64),
    Promoted(i64),
    AlreadyAdmin(i64),
}

pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    let username = config.bootstrap_username.trim();
    if username.is_empty() {
        return Ok(BootstrapOutcome::NotConfigured);
    }

    let users = UserRepository::new(pool.clone());

    if let Some(existing) = users.find_by_username(username).await? {
        if existing.is_admin {
            info!(user_id = existing.id, "Bootstrap admin already exists");
            return Ok(BootstrapOutcome::AlreadyAdmin(existing.id));
        }
        users.set_admin(existing.id, true).await?;
        warn!(user_id = existing.id, username, "Existing account promoted to admin");
        return Ok(BootstrapOutcome::Promoted(existing.id));
    }

    if config.bootstrap_password.is_empty() || config.bootstrap_email.trim().is_empty() {
        warn!(
            "CERTAMEN__ADMIN__BOOTSTRAP_USERNAME is set without email or password - skipping bootstrap"
        );
        return Ok(BootstrapOutcome::NotConfigured);
    }

    let password_hash = hash_password(&config.bootstrap_password)?;
    let created = users
        .create_user(&NewUser {
            username,
            email: config.bootstrap_email.trim(),
            first_name: "",
            last_name: "",
            password_hash: &password_hash,
            is_admin: true,
        })
        .await?;

    info!(user_id = created.id, username, "Bootstrap admin created");
    warn!(
        "SECURITY: remove CERTAMEN__ADMIN__BOOTSTRAP_PASSWORD from the environment after initial setup"
    );

    Ok(BootstrapOutcome::Created(created.id))
}
