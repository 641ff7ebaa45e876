//! Liveness and readiness probes.
//!
//! Both answer a plain-text `OK`; readiness does not probe dependencies.

use axum::{Router, routing::get};

pub async fn healthz() -> &'static str {
    "OK"
}

pub async fn readyz() -> &'static str {
    "OK"
}

/// Router with `/healthz` and `/readyz`.
pub fn health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
