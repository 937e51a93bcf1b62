//! Sign-up, login and token management routes.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use domain::models::UserResponse;
use serde::{Deserialize, Serialize};
use shared::jwt::TokenPair;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ValidationDetail};
use crate::services::auth::{AuthError, AuthResult, AuthService, Registration};

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        custom(function = "shared::validation::validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 30, message = "First name must be at most 30 characters"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 30, message = "Last name must be at most 30 characters"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub password_confirm: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of refresh and logout.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

impl From<TokenPair> for TokensResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            expires_in: (pair.access.expires_at - Utc::now()).num_seconds().max(0),
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Response of register, login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokensResponse,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: result.user.into(),
            tokens: result.tokens.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UsernameTaken | AuthError::EmailTaken => ApiError::Conflict(err.to_string()),
            AuthError::PasswordMismatch => ApiError::unprocessable(vec![ValidationDetail {
                field: "password_confirm".to_string(),
                message: err.to_string(),
            }]),
            AuthError::WeakPassword(problems) => ApiError::unprocessable(
                problems
                    .into_iter()
                    .map(|message| ValidationDetail {
                        field: "password".to_string(),
                        message,
                    })
                    .collect(),
            ),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid username or password".to_string())
            }
            AuthError::UserDisabled => ApiError::Forbidden("This account is inactive".to_string()),
            AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized("Invalid or expired refresh token".to_string())
            }
            AuthError::Database(db_err) => ApiError::from(db_err),
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
        }
    }
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone(), state.clock.clone());
    let result = service
        .register(&Registration {
            username: request.username.trim(),
            email: request.email.trim(),
            first_name: request.first_name.trim(),
            last_name: request.last_name.trim(),
            password: &request.password,
            password_confirm: &request.password_confirm,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone(), state.clock.clone());
    let result = service
        .login(request.username.trim(), &request.password)
        .await?;

    Ok(Json(result.into()))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone(), state.clock.clone());
    let result = service.refresh(&request.refresh_token).await?;

    Ok(Json(result.into()))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone(), state.clock.clone());
    service.logout(&request.refresh_token).await?;

    Ok(StatusCode::NO_CONTENT)
}
