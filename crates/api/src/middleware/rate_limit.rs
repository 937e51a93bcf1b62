//! Per-user rate limiting for authenticated routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use serde_json::json;
use std::num::NonZeroU32;

use crate::app::AppState;
use crate::middleware::user_auth::UserAuth;

type UserRateLimiter = RateLimiter<i64, DefaultKeyedStateStore<i64>, DefaultClock>;

/// One GCRA bucket per user ID.
pub struct RateLimiterState {
    limiter: UserRateLimiter,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// `None` when the limit is 0 (rate limiting disabled).
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
        })
    }

    /// `Err(retry_after_secs)` when the user is over the limit.
    pub fn check(&self, user_id: i64) -> Result<(), u64> {
        self.limiter.check_key(&user_id).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    /// Forgets users whose bucket has fully refilled. Returns the number of
    /// users still tracked.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    pub fn tracked_users(&self) -> usize {
        self.limiter.len()
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_users", &self.tracked_users())
            .finish()
    }
}

/// Must run after `require_user_auth`, which puts [`UserAuth`] in the
/// request extensions.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (Some(limiter), Some(auth)) = (
        state.rate_limiter.as_ref(),
        req.extensions().get::<UserAuth>(),
    ) else {
        return next.run(req).await;
    };

    if let Err(retry_after) = limiter.check(auth.user_id) {
        tracing::debug!(user_id = auth.user_id, retry_after, "Rate limit exceeded");
        return rate_limited_response(limiter.rate_limit_per_minute(), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_disables_limiter() {
        assert!(RateLimiterState::new(0).is_none());
    }

    #[test]
    fn test_limiter_exhaustion_is_per_user() {
        let state = RateLimiterState::new(2).unwrap();

        assert!(state.check(1).is_ok());
        assert!(state.check(1).is_ok());
        let retry_after = state.check(1).unwrap_err();
        assert!(retry_after >= 1);

        // Another user has a separate bucket.
        assert!(state.check(2).is_ok());
    }

    #[test]
    fn test_prune_keeps_users_still_limited() {
        let state = RateLimiterState::new(1).unwrap();
        assert!(state.check(1).is_ok());
        assert!(state.check(2).is_ok());
        assert_eq!(state.tracked_users(), 2);

        // Both buckets are still draining, so nothing is forgotten.
        assert_eq!(state.prune(), 2);
        assert!(state.check(1).is_err());
    }

    #[test]
    fn test_rate_limited_response() {
        let response = rate_limited_response(60, 7);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "7");
    }

    #[test]
    fn test_debug_output() {
        let state = RateLimiterState::new(30).unwrap();
        let debug = format!("{:?}", state);
        assert!(debug.contains("rate_limit_per_minute: 30"));
    }
}
