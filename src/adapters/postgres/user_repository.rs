//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::user::User;
use crate::ports::{RepositoryError, UserRepository};

use super::map_sqlx_error;

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.full_name.as_deref())
        .bind(user.is_active)
        .bind(user.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert user", e))?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, full_name, is_active, created_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch user by email", e))?;

        Ok(row.map(|row| row_to_user(&row)))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, full_name, is_active, created_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch user by id", e))?;

        Ok(row.map(|row| row_to_user(&row)))
    }

    async fn record_login(&self, id: UserId, at: Timestamp) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to record login", e))?;

        Ok(())
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    let last_login_at: Option<chrono::DateTime<chrono::Utc>> = row.get("last_login_at");
    User {
        id: UserId::from_uuid(row.get("id")),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        full_name: row.get("full_name"),
        is_active: row.get("is_active"),
        created_at: Timestamp::from_datetime(row.get("created_at")),
        last_login_at: last_login_at.map(Timestamp::from_datetime),
    }
}
