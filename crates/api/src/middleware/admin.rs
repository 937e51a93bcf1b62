//! Administrator access control.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// Staff account that passed [`require_admin`], available to handlers via
/// request extensions.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: i64,
    pub username: String,
}

/// Must run after `require_user_auth`. The admin flag is read from the
/// database on every request, so revoking it takes effect immediately.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth) = req.extensions().get::<UserAuth>().cloned() else {
        return ApiError::Unauthorized("Authentication required".into()).into_response();
    };

    let repo = UserRepository::new(state.pool.clone());
    let user = match repo.find_by_id(auth.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return ApiError::Unauthorized("Account no longer exists".into()).into_response()
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    if !user.is_active || !user.is_admin {
        tracing::info!(user_id = user.id, "Non-admin denied access to admin route");
        return ApiError::Forbidden("Administrator access required".into()).into_response();
    }

    req.extensions_mut().insert(AdminUser {
        user_id: user.id,
        username: user.username,
    });
    next.run(req).await
}
