use axum_helpers::{AppError, AppResult};
use observability::UserMetrics;

use crate::error::RepositoryError;
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserListResponse, UserResponse};
use crate::repository::DynUserRepository;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Normalized pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub page_size: u64,
}

impl Page {
    /// `page < 1` becomes 1; a size outside `1..=100` becomes 10.
    pub fn normalize(page: i64, page_size: i64) -> Self {
        let page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let page_size = u64::try_from(page_size)
            .ok()
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}

/// Service layer for User business logic
#[derive(Clone)]
pub struct UserService {
    repository: DynUserRepository,
    metrics: UserMetrics,
}

impl UserService {
    pub fn new(repository: DynUserRepository, metrics: UserMetrics) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    pub fn repository(&self) -> &DynUserRepository {
        &self.repository
    }

    /// Create a new user; the email must not be taken
    pub async fn create_user(&self, input: CreateUserRequest) -> AppResult<UserResponse> {
        let result = self.try_create_user(input).await;
        if let Ok(user) = &result {
            self.metrics.record_user_created();
            tracing::info!(user_id = %user.id, email = %user.email, "Created user");
        }
        self.observe("create", result)
    }

    async fn try_create_user(&self, input: CreateUserRequest) -> AppResult<UserResponse> {
        if self.repository.get_by_email(&input.email).await?.is_some() {
            return Err(email_taken(input.email));
        }

        let user = User::new(input.email, input.name, input.role);
        let created = self.repository.create(user).await.map_err(|e| match e {
            RepositoryError::DuplicateEmail(email) => email_taken(email),
            other => other.into(),
        })?;

        Ok(created.into())
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: &str) -> AppResult<UserResponse> {
        let result = self.find_user(id).await.map(UserResponse::from);
        self.observe("get", result)
    }

    /// One page of users, newest first
    pub async fn list_users(&self, page: i64, page_size: i64) -> AppResult<UserListResponse> {
        let window = Page::normalize(page, page_size);
        let result = self.try_list_users(window).await;
        if let Ok(list) = &result {
            tracing::debug!(
                page = list.page,
                page_size = list.page_size,
                returned = list.users.len(),
                total = list.total,
                "Listed users"
            );
        }
        self.observe("list", result)
    }

    async fn try_list_users(&self, window: Page) -> AppResult<UserListResponse> {
        let users = self
            .repository
            .list(window.page_size, window.offset())
            .await?;
        let total = self.repository.count().await?;

        Ok(UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            total,
            page: window.page,
            page_size: window.page_size,
            total_pages: window.total_pages(total),
        })
    }

    /// Update the fields present in `input`
    pub async fn update_user(&self, id: &str, input: UpdateUserRequest) -> AppResult<UserResponse> {
        let result = self.try_update_user(id, input).await;
        if let Ok(user) = &result {
            tracing::info!(user_id = %user.id, "Updated user");
        }
        self.observe("update", result)
    }

    async fn try_update_user(&self, id: &str, input: UpdateUserRequest) -> AppResult<UserResponse> {
        let mut user = self.find_user(id).await?;

        if let Some(email) = input.email.as_deref() {
            if let Some(owner) = self.repository.get_by_email(email).await? {
                if owner.id != user.id {
                    return Err(email_in_use(email));
                }
            }
        }

        user.apply_update(input);

        let updated = self.repository.update(user).await.map_err(|e| match e {
            RepositoryError::DuplicateEmail(email) => email_in_use(&email),
            other => other.into(),
        })?;

        Ok(updated.into())
    }

    /// Delete a user
    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        let result = self.try_delete_user(id).await;
        if result.is_ok() {
            tracing::info!(user_id = %id, "Deleted user");
        }
        self.observe("delete", result)
    }

    async fn try_delete_user(&self, id: &str) -> AppResult<()> {
        self.find_user(id).await?;

        // A concurrent delete can win between the lookup and this call.
        if !self.repository.delete(id).await? {
            return Err(AppError::not_found("User", id));
        }

        Ok(())
    }

    async fn find_user(&self, id: &str) -> AppResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    /// Records `app_operations_total` and logs failures.
    fn observe<T>(&self, operation: &'static str, result: AppResult<T>) -> AppResult<T> {
        match &result {
            Ok(_) => self.metrics.record_operation(operation, "success"),
            Err(err) => {
                self.metrics.record_operation(operation, "error");
                if err.status().is_server_error() {
                    tracing::error!(operation, error = %err, "User operation failed");
                } else {
                    tracing::warn!(operation, error = %err, "User operation rejected");
                }
            }
        }
        result
    }
}

fn email_taken(email: String) -> AppError {
    AppError::conflict("User with this email already exists").with_detail(email)
}

fn email_in_use(email: &str) -> AppError {
    AppError::conflict("Email is already in use").with_detail(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repository::MockUserRepository;
    use axum::http::StatusCode;
    use mockall::predicate::eq;
    use sea_orm::DbErr;
    use std::sync::Arc;

    fn service(mock: MockUserRepository) -> UserService {
        UserService::new(Arc::new(mock), UserMetrics::new())
    }

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            name: "Test User".to_string(),
            role: Role::User,
        }
    }

    fn stored(email: &str) -> User {
        User::new(email.to_string(), "Test User".to_string(), Role::User)
    }

    #[test]
    fn test_page_normalization() {
        assert_eq!(Page::normalize(0, 0), Page { page: 1, page_size: 10 });
        assert_eq!(Page::normalize(-3, 101), Page { page: 1, page_size: 10 });
        assert_eq!(Page::normalize(3, 100), Page { page: 3, page_size: 100 });
        assert_eq!(Page::normalize(2, 5).offset(), 5);

        let page = Page::normalize(1, 2);
        assert_eq!(page.total_pages(5), 3);
        assert_eq!(page.total_pages(4), 2);
        assert_eq!(page.total_pages(0), 0);
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email().times(1).returning(|_| Ok(None));
        mock.expect_create().times(1).returning(Ok);

        let user = service(mock)
            .create_user(create_request("new@example.com"))
            .await
            .unwrap();

        assert_eq!(user.email, "new@example.com");
        assert!(user.active);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[tokio::test]
    async fn test_create_user_conflict_on_existing_email() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email()
            .returning(|email| Ok(Some(stored(email))));
        mock.expect_create().never();

        let err = service(mock)
            .create_user(create_request("taken@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "User with this email already exists");
        assert_eq!(err.detail(), Some("taken@example.com"));
    }

    #[tokio::test]
    async fn test_create_user_conflict_raised_by_storage() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email().returning(|_| Ok(None));
        mock.expect_create()
            .returning(|user| Err(RepositoryError::DuplicateEmail(user.email)));

        let err = service(mock)
            .create_user(create_request("race@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic_internal_error() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email()
            .returning(|_| Err(DbErr::Custom("password=hunter2 host=db".to_string()).into()));

        let err = service(mock)
            .create_user(create_request("x@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Internal server error");
        let body = serde_json::to_string(&err.to_response_body()).unwrap();
        assert!(!body.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id().returning(|_| Ok(None));

        let err = service(mock).get_user("missing").await.unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "User not found");
        assert_eq!(err.detail(), Some("ID: missing"));
    }

    #[tokio::test]
    async fn test_list_users_normalizes_window() {
        let mut mock = MockUserRepository::new();
        mock.expect_list()
            .with(eq(10), eq(0))
            .returning(|_, _| Ok(vec![stored("a@example.com")]));
        mock.expect_count().returning(|| Ok(21));

        let list = service(mock).list_users(0, 1000).await.unwrap();

        assert_eq!(list.page, 1);
        assert_eq!(list.page_size, 10);
        assert_eq!(list.total, 21);
        assert_eq!(list.total_pages, 3);
        assert_eq!(list.users.len(), 1);
    }

    #[tokio::test]
    async fn test_list_users_offset_for_later_pages() {
        let mut mock = MockUserRepository::new();
        mock.expect_list()
            .with(eq(5), eq(10))
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_count().returning(|| Ok(12));

        let list = service(mock).list_users(3, 5).await.unwrap();

        assert!(list.users.is_empty());
        assert_eq!(list.total_pages, 3);
    }

    #[tokio::test]
    async fn test_update_user_email_of_other_user_conflicts() {
        let current = stored("me@example.com");
        let current_id = current.id.clone();

        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        mock.expect_get_by_email()
            .returning(|email| Ok(Some(stored(email))));
        mock.expect_update().never();

        let err = service(mock)
            .update_user(
                &current_id,
                UpdateUserRequest {
                    email: Some("other@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "Email is already in use");
    }

    #[tokio::test]
    async fn test_update_user_keeping_own_email() {
        let current = stored("me@example.com");
        let lookup = current.clone();
        let by_email = current.clone();

        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        mock.expect_get_by_email()
            .returning(move |_| Ok(Some(by_email.clone())));
        mock.expect_update().times(1).returning(Ok);

        let updated = service(mock)
            .update_user(
                &current.id,
                UpdateUserRequest {
                    email: Some("me@example.com".to_string()),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "me@example.com");
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.name, "Test User");
        assert!(updated.updated_at >= current.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_user_not_found() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id().returning(|_| Ok(None));
        mock.expect_update().never();

        let err = service(mock)
            .update_user("missing", UpdateUserRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_user_lost_race_is_not_found() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(|id| {
                let mut user = stored("gone@example.com");
                user.id = id.to_string();
                Ok(Some(user))
            });
        mock.expect_update()
            .times(1)
            .returning(|user| Err(RepositoryError::NotFound(user.id)));

        let err = service(mock)
            .update_user(
                "abc",
                UpdateUserRequest {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.detail(), Some("ID: abc"));
    }

    #[tokio::test]
    async fn test_delete_user_lost_race_is_not_found() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id()
            .returning(|id| {
                let mut user = stored("gone@example.com");
                user.id = id.to_string();
                Ok(Some(user))
            });
        mock.expect_delete().returning(|_| Ok(false));

        let err = service(mock).delete_user("abc").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_user_skips_delete() {
        let mut mock = MockUserRepository::new();
        mock.expect_get_by_id().returning(|_| Ok(None));
        mock.expect_delete().never();

        let err = service(mock).delete_user("missing").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_operations_are_counted() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let mut mock = MockUserRepository::new();
        mock.expect_get_by_email().returning(|_| Ok(None));
        mock.expect_create().returning(Ok);
        mock.expect_get_by_id().returning(|_| Ok(None));
        let service = service(mock);

        service.create_user(create_request("m@example.com")).await.unwrap();
        service.get_user("missing").await.unwrap_err();

        let rendered = handle.render();
        assert!(rendered.contains("app_users_total 1"));
        assert!(rendered.contains(r#"app_operations_total{operation="create",status="success"} 1"#));
        assert!(rendered.contains(r#"app_operations_total{operation="get",status="error"} 1"#));
    }
}
