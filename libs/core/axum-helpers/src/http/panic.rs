use crate::errors::AppError;
use axum::response::{IntoResponse, Response};
use std::any::Any;

/// Converts a caught handler panic into a 500 JSON response.
///
/// Meant for `tower_http::catch_panic::CatchPanicLayer::custom`. The panic
/// payload is logged inside the current request span and never sent to
/// the client.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %reason, "handler panicked");

    AppError::internal().into_response()
}
