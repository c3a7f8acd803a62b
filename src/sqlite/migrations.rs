//! Embedded schema migrations for `SQLite`.
//!
//! # Example
//!
//! ```rust,ignore
//! use doc_teams::sqlite::migrations;
//! use sqlx::SqlitePool;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250301000001_create_users_table",
        include_str!("../../migrations_sqlite/20250301000001_create_users_table.sql"),
    ),
    (
        "20250301000002_create_teams_table",
        include_str!("../../migrations_sqlite/20250301000002_create_teams_table.sql"),
    ),
    (
        "20250301000003_create_team_memberships_table",
        include_str!("../../migrations_sqlite/20250301000003_create_team_memberships_table.sql"),
    ),
    (
        "20250301000004_create_document_comments_table",
        include_str!("../../migrations_sqlite/20250301000004_create_document_comments_table.sql"),
    ),
];

/// Runs every pending migration in order.
///
/// Applied migrations are recorded in the `_doc_teams_migrations` table, so
/// calling this on an up-to-date database is a no-op.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _doc_teams_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM _doc_teams_migrations WHERE name = ?)",
        )
        .bind(*name)
        .fetch_one(pool)
        .await?;

        if applied {
            continue;
        }

        log::info!(target: "doc_teams", "msg=\"applying migration\", name=\"{name}\"");

        // Statements are split on `;`, so migrations must not contain
        // semicolons inside string literals.
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                pool.execute(trimmed).await?;
            }
        }

        sqlx::query("INSERT INTO _doc_teams_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;
    }

    Ok(())
}
