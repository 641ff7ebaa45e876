use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{AppResult, ValidatedJson};
use serde_json::json;
use std::sync::Arc;

use crate::models::{
    CreateUserRequest, ListUsersQuery, MessageResponse, UpdateUserRequest, UserListResponse,
    UserResponse,
};
use crate::service::UserService;

/// Create the users router with all HTTP endpoints
///
/// Mount it under `/api/v1/users`.
pub fn router(service: UserService) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(shared_service)
}

/// List users, one page at a time
///
/// GET /users?page=1&page_size=10
///
/// Values that are missing or unusable fall back to the defaults.
async fn list_users(
    State(service): State<Arc<UserService>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> AppResult<Json<UserListResponse>> {
    let query = query
        .map(|Query(query)| query)
        .inspect_err(|rejection| tracing::debug!(%rejection, "ignoring list query"))
        .unwrap_or_default();

    let list = service.list_users(query.page(), query.page_size()).await?;
    Ok(Json(list))
}

/// Create a new user
///
/// POST /users
async fn create_user(
    State(service): State<Arc<UserService>>,
    ValidatedJson(input): ValidatedJson<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
///
/// GET /users/{id}
async fn get_user(
    State(service): State<Arc<UserService>>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = service.get_user(&id).await?;
    Ok(Json(user))
}

/// Update a user
///
/// PUT /users/{id}
async fn update_user(
    State(service): State<Arc<UserService>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = service.update_user(&id, input).await?;
    Ok(Json(user))
}

/// Delete a user
///
/// DELETE /users/{id}
async fn delete_user(
    State(service): State<Arc<UserService>>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    service.delete_user(&id).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
        data: Some(json!({ "id": id })),
    }))
}
