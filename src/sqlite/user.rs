use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{db_error, is_unique_violation, SqliteTransaction};
use crate::users::{CreateUser, User, UserRepository};
use crate::TeamError;

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    external_id: String,
    username: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: row.id,
            external_id: row.external_id,
            username: row.username,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for SqliteTransaction {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, data), err))]
    async fn create_user(&mut self, data: CreateUser) -> Result<User, TeamError> {
        let now = Utc::now();

        let row: UserRecord = sqlx::query_as(
            r"
            INSERT INTO users (external_id, username, email, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, external_id, username, email, created_at, updated_at
            ",
        )
        .bind(&data.external_id)
        .bind(&data.username)
        .bind(&data.email)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TeamError::InvalidState(format!(
                    "external id {} is already registered",
                    data.external_id
                ))
            } else {
                db_error("create_user")(e)
            }
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user(&mut self, id: i64) -> Result<Option<User>, TeamError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, external_id, username, email, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("find_user"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_external_id(
        &mut self,
        external_id: &str,
    ) -> Result<Option<User>, TeamError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, external_id, username, email, created_at, updated_at FROM users WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("find_user_by_external_id"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn update_user_profile(
        &mut self,
        id: i64,
        username: &str,
        email: Option<&str>,
    ) -> Result<User, TeamError> {
        let row: Option<UserRecord> = sqlx::query_as(
            r"
            UPDATE users SET username = ?, email = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, external_id, username, email, created_at, updated_at
            ",
        )
        .bind(username)
        .bind(email)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("update_user_profile"))?;

        row.map(Into::into)
            .ok_or_else(|| TeamError::not_found("user", id))
    }
}
