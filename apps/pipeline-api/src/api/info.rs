//! Service descriptor and status endpoints.

use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use core_config::{AppInfo, app_info};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::state::AppState;

pub const SERVICE_NAME: &str = "Pipeline Architecture API";

const APP: AppInfo = app_info!();

#[derive(Debug, Serialize)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub environment: String,
    pub timestamp: String,
    pub version: &'static str,
}

/// GET /
pub async fn index() -> Json<ServiceDescriptor> {
    let endpoints = BTreeMap::from([
        ("health", "/healthz"),
        ("readiness", "/readyz"),
        ("users", "/api/v1/users"),
        ("status", "/api/v1/status"),
    ]);

    Json(ServiceDescriptor {
        name: SERVICE_NAME,
        version: APP.version,
        status: "running",
        endpoints,
    })
}

/// GET /api/v1/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "healthy",
        environment: state.config.environment.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        version: APP.version,
    })
}
