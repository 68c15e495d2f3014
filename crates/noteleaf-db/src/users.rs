//! User repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use noteleaf_core::{Error, Result, User, UserRepository};

/// PostgreSQL implementation of UserRepository.
///
/// Expects emails in normalized form (the identity service normalizes
/// before calling in); the unique index on `users.email` backstops
/// concurrent registrations.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_user(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, email: &str) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, created_at)
             VALUES ($1, $2, $3)
             RETURNING id, email, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(map_row_to_user(row)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                Error::Conflict(format!("email '{}' is already registered", email)),
            ),
            Err(err) => Err(Error::Database(err)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(map_row_to_user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(map_row_to_user))
    }
}
