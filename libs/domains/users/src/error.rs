use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;

/// Failures reported by a [`crate::UserRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("User '{0}' does not exist")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail(email) => {
                AppError::conflict("User with this email already exists").with_detail(email)
            }
            RepositoryError::NotFound(id) => AppError::not_found("User", id),
            RepositoryError::Database(e) => AppError::internal().with_source(e),
        }
    }
}
