use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::clock::Clock;
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{admin_events, auth, events, health, users};

/// Slack above `limits.max_image_bytes` so oversize uploads still reach the
/// handler and get a JSON error instead of a bare 413.
const IMAGE_BODY_SLACK: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    /// Source of publish timestamps.
    pub clock: Arc<dyn Clock>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, clock: Arc<dyn Clock>) -> Result<Self, JwtError> {
        let jwt = JwtConfig::from_rsa_pem(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.refresh_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;
        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            clock,
            rate_limiter,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Development default: any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/featured", get(events::featured_event))
        // Optional auth through the extractor
        .route("/api/v1/events/:event_id", get(events::get_event));

    // Route layers run bottom-up: auth first, then rate limiting.
    let user_routes = Router::new()
        .route("/api/v1/events/:event_id/join", post(events::join_event))
        .route("/api/v1/events/:event_id/leave", post(events::leave_event))
        .route("/api/v1/users/me", get(users::get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    let image_body_limit = config.limits.max_image_bytes + IMAGE_BODY_SLACK;
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/events",
            get(admin_events::list_events).post(admin_events::create_event),
        )
        .route(
            "/api/v1/admin/events/:event_id",
            get(admin_events::get_event)
                .put(admin_events::update_event)
                .delete(admin_events::delete_event),
        )
        .route(
            "/api/v1/admin/events/:event_id/feature",
            post(admin_events::feature_event),
        )
        .route(
            "/api/v1/admin/events/:event_id/image",
            put(admin_events::set_image)
                .delete(admin_events::clear_image)
                .layer(DefaultBodyLimit::max(image_body_limit)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
