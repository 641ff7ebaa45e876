use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr,
    FromQueryResult, SqlErr, Statement,
};
use std::time::Duration;
use tracing::info;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Role, User};
use crate::repository::UserRepository;

const USER_COLUMNS: &str = "id, email, name, role, active, created_at, updated_at";

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a pooled connection to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(database_url);
        opt.max_connections(25)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .max_lifetime(Duration::from_secs(300))
            .sqlx_logging(true);

        let db = Database::connect(opt).await?;
        info!("Successfully connected to PostgreSQL database");

        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Helper struct for deserializing user rows from the database
#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(DbErr::Type)?;

        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

/// Maps a unique-index violation on write to `DuplicateEmail`.
fn map_write_error(err: DbErr, email: &str) -> RepositoryError {
    let unique_violation = matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err
            .to_string()
            .contains("duplicate key value violates unique constraint");

    if unique_violation {
        RepositoryError::DuplicateEmail(email.to_string())
    } else {
        RepositoryError::Database(err)
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.id.clone().into(),
                user.email.clone().into(),
                user.name.clone().into(),
                user.role.as_str().into(),
                user.active.into(),
                user.created_at.into(),
                user.updated_at.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_write_error(e, &user.email))?
            .ok_or_else(|| DbErr::RecordNotInserted)?;

        row.try_into()
    }

    async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [email.into()]);

        UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        // updated_at never moves backwards
        let sql = format!(
            "UPDATE users \
             SET email = $2, name = $3, role = $4, active = $5, \
                 updated_at = GREATEST(NOW(), updated_at) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.id.clone().into(),
                user.email.clone().into(),
                user.name.clone().into(),
                user.role.as_str().into(),
                user.active.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_write_error(e, &user.email))?
            .ok_or_else(|| RepositoryError::NotFound(user.id.clone()))?;

        row.try_into()
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM users WHERE id = $1",
            [id.into()],
        );

        let result = self.db.execute_raw(stmt).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: u64, offset: u64) -> RepositoryResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [limit.into(), offset.into()]);

        UserRow::find_by_statement(stmt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT COUNT(*) AS count FROM users",
        );

        let row = CountRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(row.map_or(0, |r| r.count.max(0) as u64))
    }

    async fn close(&self) -> RepositoryResult<()> {
        self.db.clone().close().await?;
        info!("PostgreSQL connection pool closed");
        Ok(())
    }
}
