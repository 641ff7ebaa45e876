use axum::http::{HeaderName, HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Creates the CORS layer for the API.
///
/// With a non-empty origin list only those origins are allowed and
/// credentials are permitted. An empty list allows any origin; browsers
/// reject wildcard origins with credentials, so credentials stay off there.
/// Origins that are not valid header values are skipped with a warning.
///
/// Shared settings:
/// - Methods: GET, POST, PUT, PATCH, DELETE, OPTIONS
/// - Headers: Accept, Authorization, Content-Type, X-CSRF-Token, X-Request-ID
/// - Exposed: X-Request-ID
/// - Max age: 300 seconds
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let request_id = HeaderName::from_static("x-request-id");

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
            request_id.clone(),
        ])
        .expose_headers([request_id])
        .max_age(Duration::from_secs(300));

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}
