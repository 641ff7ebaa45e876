use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::ErrorResponse;

/// Fallback handler for unmatched routes.
pub async fn not_found() -> Response {
    let body = Json(ErrorResponse::new(StatusCode::NOT_FOUND, "Resource not found"));

    (StatusCode::NOT_FOUND, body).into_response()
}
