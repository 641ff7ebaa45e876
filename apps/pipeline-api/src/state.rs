//! Application state management.
//!
//! The state is built once in `main` and handed to [`crate::api::routes`],
//! which gives each domain router the pieces it needs.

use core_config::AppConfig;
use domain_users::UserService;
use std::sync::Arc;

/// Shared application state.
///
/// Cloning is cheap: the configuration sits behind an `Arc` and the service
/// only holds an `Arc` to its repository.
#[derive(Clone)]
pub struct AppState {
    /// Configuration resolved at startup
    pub config: Arc<AppConfig>,
    /// User management, backed by PostgreSQL or the in-memory store
    pub users: UserService,
}

impl AppState {
    pub fn new(config: AppConfig, users: UserService) -> Self {
        Self {
            config: Arc::new(config),
            users,
        }
    }
}
