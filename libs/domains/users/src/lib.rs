//! Users Domain
//!
//! User management behind a small REST surface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business rules, error translation, metrics
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + in-memory and PostgreSQL implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entity, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//! use observability::UserMetrics;
//!
//! let repository = Arc::new(InMemoryUserRepository::new());
//! let service = UserService::new(repository, UserMetrics::new());
//!
//! let router = handlers::router(service);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{RepositoryError, RepositoryResult};
pub use models::{
    CreateUserRequest, MessageResponse, Role, UpdateUserRequest, User, UserListResponse,
    UserResponse,
};
pub use postgres::PostgresUserRepository;
pub use repository::{DynUserRepository, InMemoryUserRepository, UserRepository};
pub use service::UserService;
