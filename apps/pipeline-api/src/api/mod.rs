use axum::{Router, routing::get};
use axum_helpers::{HttpOptions, apply_middleware, health_router};
use core_config::AppConfig;

use crate::state::AppState;

pub mod info;

/// Routes under `/api/v1`.
///
/// Each domain router carries its own state, so the result is stateless.
pub fn v1_routes(state: &AppState) -> Router {
    Router::new()
        .route("/status", get(info::status))
        .with_state(state.clone())
        .nest("/users", domain_users::handlers::router(state.users.clone()))
}

/// The complete application router, middleware included.
pub fn routes(state: &AppState) -> Router {
    let router = Router::new()
        .route("/", get(info::index))
        .nest("/api/v1", v1_routes(state))
        .merge(health_router());

    apply_middleware(router, &http_options(&state.config))
}

/// Middleware settings derived from the configuration.
pub fn http_options(config: &AppConfig) -> HttpOptions {
    HttpOptions {
        request_timeout: config.request_timeout(),
        max_header_size: config.max_header_size,
        cors_allowed_origins: config.cors_allowed_origins.clone(),
        security_headers: config.security_headers,
    }
}
