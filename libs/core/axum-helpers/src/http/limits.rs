use crate::errors::ErrorResponse;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Upper bound, in bytes, for the summed size of all request header names
/// and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLimit(pub usize);

pub(crate) fn header_bytes(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum()
}

/// Rejects requests whose headers exceed the limit with 431.
///
/// Use with `axum::middleware::from_fn_with_state(HeaderLimit(n), header_size_guard)`.
pub async fn header_size_guard(
    State(limit): State<HeaderLimit>,
    request: Request,
    next: Next,
) -> Response {
    let size = header_bytes(request.headers());
    if size > limit.0 {
        tracing::warn!(size, limit = limit.0, "request headers too large");
        let status = StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE;
        return (
            status,
            Json(ErrorResponse::new(status, "Request headers too large")),
        )
            .into_response();
    }

    next.run(request).await
}
