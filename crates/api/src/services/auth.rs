//! Account registration, login and refresh-token sessions.

use domain::clock::Clock;
use domain::models::User;
use persistence::repositories::{NewUser, UserRepository};
use shared::crypto::session_token_hash;
use shared::jwt::{extract_user_id, JwtConfig, JwtError, TokenPair};
use shared::password::{check_password_strength, hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("A user with that username already exists")]
    UsernameTaken,

    #[error("A user with that email already exists")]
    EmailTaken,

    #[error("The two password fields didn't match")]
    PasswordMismatch,

    #[error("Password does not meet requirements")]
    WeakPassword(Vec<String>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Input of a sign-up, already shape-validated by the route.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

/// A signed-in user and the tokens issued for the new session.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub tokens: TokenPair,
}

/// Authentication service.
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
            clock,
        }
    }

    /// Creates a regular (non-admin) account and signs it in.
    pub async fn register(&self, input: &Registration<'_>) -> Result<AuthResult, AuthError> {
        if input.password != input.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        check_password_strength(input.password, input.username)
            .map_err(AuthError::WeakPassword)?;

        if self.users.find_by_username(input.username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.email_exists(input.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(input.password)?;
        let entity = self
            .users
            .create_user(&NewUser {
                username: input.username,
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                password_hash: &password_hash,
                is_admin: false,
            })
            .await
            .map_err(map_unique_violation)?;

        info!(user_id = entity.id, username = %entity.username, "User registered");

        let user: User = entity.into();
        let tokens = self.start_session(user.id).await?;
        Ok(AuthResult { user, tokens })
    }

    /// Username/password login.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResult, AuthError> {
        let Some(entity) = self.users.find_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &entity.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !entity.is_active {
            return Err(AuthError::UserDisabled);
        }

        let now = self.clock.now();
        self.users.update_last_login(entity.id, now).await?;

        let mut user: User = entity.into();
        user.last_login_at = Some(now);
        let tokens = self.start_session(user.id).await?;
        debug!(user_id = user.id, "User logged in");
        Ok(AuthResult { user, tokens })
    }

    /// Rotates a refresh token: the presented session is consumed and a new
    /// one is issued. A replayed refresh token finds no session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResult, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(invalid_refresh)?;
        let user_id = extract_user_id(&claims).map_err(invalid_refresh)?;

        let session = self
            .users
            .take_session(&session_token_hash(&claims.jti))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if session.user_id != user_id {
            return Err(AuthError::InvalidRefreshToken);
        }

        let entity = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !entity.is_active {
            return Err(AuthError::UserDisabled);
        }

        let user: User = entity.into();
        let tokens = self.start_session(user.id).await?;
        Ok(AuthResult { user, tokens })
    }

    /// Revokes the session bound to the refresh token. Logging out twice is
    /// not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(invalid_refresh)?;

        let removed = self
            .users
            .delete_session(&session_token_hash(&claims.jti))
            .await?;
        if !removed {
            debug!(sub = %claims.sub, "Session already gone at logout");
        }
        Ok(())
    }

    async fn start_session(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let tokens = self.jwt.issue_pair(user_id)?;
        self.users
            .create_session(
                user_id,
                &session_token_hash(&tokens.refresh.jti),
                tokens.refresh.expires_at,
            )
            .await?;
        Ok(tokens)
    }
}

fn invalid_refresh(err: JwtError) -> AuthError {
    match err {
        JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
            AuthError::InvalidRefreshToken
        }
        other => AuthError::Token(other),
    }
}

/// A concurrent sign-up can pass the pre-checks and still hit a unique index.
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return match db_err.constraint() {
                Some("idx_users_email_lower") => AuthError::EmailTaken,
                _ => AuthError::UsernameTaken,
            };
        }
    }
    AuthError::Database(err)
}
