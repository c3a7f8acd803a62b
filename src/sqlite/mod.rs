//! `SQLite` backend.
//!
//! [`SqliteStore`] wraps a connection pool; each [`SqliteTransaction`] is a
//! database transaction implementing every repository trait. Run
//! [`migrations::run`] once before use.
//!
//! ```rust,ignore
//! use doc_teams::sqlite::{migrations, SqliteStore};
//! use sqlx::SqlitePool;
//!
//! let pool = SqlitePool::connect("sqlite://teams.db?mode=rwc").await?;
//! migrations::run(&pool).await?;
//! let store = SqliteStore::new(pool);
//! ```

mod comment;
mod membership;
pub mod migrations;
mod team;
mod user;

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool};

use crate::store::{Store, StoreTransaction};
use crate::TeamError;

/// `SQLite`-backed [`Store`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    type Transaction = SqliteTransaction;

    // Mutations read before they write. Taking the write lock up front makes
    // contending writers wait on the busy timeout instead of failing to
    // upgrade with SQLITE_BUSY.
    async fn begin(&self) -> Result<SqliteTransaction, TeamError> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(db_error("begin"))?;
        Ok(SqliteTransaction { tx })
    }
}

/// An open `SQLite` transaction holding the database write lock. Rolled back
/// on drop unless committed.
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn commit(self) -> Result<(), TeamError> {
        self.tx.commit().await.map_err(db_error("commit"))
    }
}

/// Logs a store failure and wraps it as [`TeamError::DatabaseError`].
fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> TeamError {
    move |e| {
        log::error!(target: "doc_teams", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
        TeamError::DatabaseError(e.to_string())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
}

/// A stored enum column holding a value this crate does not know.
fn corrupt_column(column: &str, value: &str) -> TeamError {
    log::error!(target: "doc_teams", "msg=\"unreadable row\", column=\"{column}\", value=\"{value}\"");
    TeamError::DatabaseError(format!("unexpected {column} value {value:?}"))
}
