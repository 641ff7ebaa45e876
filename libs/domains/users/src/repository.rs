use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::User;

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user
    async fn create(&self, user: User) -> RepositoryResult<User>;

    /// Get a user by ID; `None` when there is no such record
    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<User>>;

    /// Get a user by exact email
    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Overwrite an existing user by id; `NotFound` when it no longer exists
    async fn update(&self, user: User) -> RepositoryResult<User>;

    /// Delete a user by ID; `false` when nothing was removed
    async fn delete(&self, id: &str) -> RepositoryResult<bool>;

    /// Newest first, ties broken by id
    async fn list(&self, limit: u64, offset: u64) -> RepositoryResult<Vec<User>>;

    /// Count total users (for pagination)
    async fn count(&self) -> RepositoryResult<u64>;

    /// Release underlying connections
    async fn close(&self) -> RepositoryResult<()>;
}

/// Repository selected at startup
pub type DynUserRepository = Arc<dyn UserRepository>;

/// In-memory implementation of UserRepository
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::DuplicateEmail(user.email));
        }

        users.insert(user.id.clone(), user.clone());

        tracing::debug!(user_id = %user.id, "Stored user");
        Ok(user)
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(user.id));
        }

        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepositoryError::DuplicateEmail(user.email));
        }

        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let mut users = self.users.write().await;
        Ok(users.remove(id).is_some())
    }

    async fn list(&self, limit: u64, offset: u64) -> RepositoryResult<Vec<User>> {
        let users = self.users.read().await;

        let mut result: Vec<User> = users.values().cloned().collect();
        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(result.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let users = self.users.read().await;
        Ok(users.len() as u64)
    }

    async fn close(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
