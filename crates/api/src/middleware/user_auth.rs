//! JWT authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use persistence::repositories::UserRepository;
use shared::jwt::{extract_user_id, JwtConfig, JwtError};

use crate::app::AppState;
use crate::error::ApiError;

/// Caller identity taken from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    pub user_id: i64,
    /// JWT ID of the access token.
    pub jti: String,
}

impl UserAuth {
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt.validate_access_token(token)?;
        Ok(UserAuth {
            user_id: extract_user_id(&claims)?,
            jti: claims.jti,
        })
    }
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid access token or whose account is gone
/// or deactivated, and stores [`UserAuth`] in the request extensions.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::Unauthorized("Missing or invalid Authorization header".into())
            .into_response();
    };

    let auth = match UserAuth::validate(&state.jwt, token) {
        Ok(auth) => auth,
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            return ApiError::Unauthorized("Invalid or expired token".into()).into_response();
        }
    };

    // Deactivation takes effect before outstanding access tokens expire.
    match UserRepository::new(state.pool.clone()).is_active(auth.user_id).await {
        Ok(Some(true)) => {}
        Ok(Some(false)) => {
            tracing::info!(user_id = auth.user_id, "Inactive account denied");
            return ApiError::Forbidden("This account is inactive".into()).into_response();
        }
        Ok(None) => {
            return ApiError::Unauthorized("Account no longer exists".into()).into_response()
        }
        Err(e) => return ApiError::from(e).into_response(),
    }

    req.extensions_mut().insert(auth);
    next.run(req).await
}
