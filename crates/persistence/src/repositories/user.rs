//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::{UserEntity, UserSessionEntity};
use crate::metrics::QueryTimer;

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash, is_admin, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// `is_active` of a user, or `None` if the account does not exist.
    pub async fn is_active(&self, id: i64) -> Result<Option<bool>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_is_active");
        let result = sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a user by username (exact match).
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_username");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash, is_admin, is_active,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether an account already uses this email (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("user_email_exists");
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        timer.record();
        Ok(row.0)
    }

    /// Create a new user account.
    pub async fn create_user(&self, user: &NewUser<'_>) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, first_name, last_name, password_hash, is_admin,
                      is_active, created_at, updated_at, last_login_at
            "#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update user's last login timestamp.
    pub async fn update_last_login(
        &self,
        user_id: i64,
        last_login_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("update_user_last_login");
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(last_login_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(())
    }

    /// Grant or revoke administrator rights.
    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("set_user_admin");
        let result = sqlx::query("UPDATE users SET is_admin = $2 WHERE id = $1")
            .bind(user_id)
            .bind(is_admin)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Create a refresh-token session.
    pub async fn create_session(
        &self,
        user_id: i64,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, refresh_token_hash, expires_at, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Atomically consume an unexpired session (refresh-token rotation).
    pub async fn take_session(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<UserSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("take_user_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            DELETE FROM user_sessions
            WHERE refresh_token_hash = $1 AND expires_at > NOW()
            RETURNING id, user_id, refresh_token_hash, expires_at, created_at, last_used_at
            "#,
        )
        .bind(refresh_token_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a session by refresh token hash (logout).
    pub async fn delete_session(&self, refresh_token_hash: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_user_session");
        let result = sqlx::query("DELETE FROM user_sessions WHERE refresh_token_hash = $1")
            .bind(refresh_token_hash)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Remove expired sessions. Returns how many were deleted.
    pub async fn delete_expired_sessions(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_sessions");
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
