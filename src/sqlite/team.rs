//! `SQLite` implementation of [`TeamRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{corrupt_column, db_error, is_unique_violation, SqliteTransaction};
use crate::teams::{CreateTeam, Team, TeamRepository, TeamStatus};
use crate::validators::ValidationError;
use crate::TeamError;

const TEAM_COLUMNS: &str =
    "id, name, description, owner_id, status, member_count, created_at, updated_at";

#[derive(FromRow)]
struct TeamRecord {
    id: i64,
    name: String,
    description: Option<String>,
    owner_id: i64,
    status: String,
    member_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TeamRecord> for Team {
    type Error = TeamError;

    fn try_from(row: TeamRecord) -> Result<Self, Self::Error> {
        let status =
            TeamStatus::parse(&row.status).ok_or_else(|| corrupt_column("teams.status", &row.status))?;
        Ok(Team {
            id: row.id,
            name: row.name,
            description: row.description,
            owner_id: row.owner_id,
            status,
            member_count: row.member_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn duplicate_or_db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> TeamError {
    move |e| {
        if is_unique_violation(&e) {
            ValidationError::DuplicateTeamName.into()
        } else {
            db_error(operation)(e)
        }
    }
}

#[async_trait]
impl TeamRepository for SqliteTransaction {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_team(&mut self, data: CreateTeam) -> Result<Team, TeamError> {
        let now = Utc::now();

        let row: TeamRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO teams (name, description, owner_id, status, member_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            RETURNING {TEAM_COLUMNS}
            "
        ))
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.owner_id)
        .bind(TeamStatus::Active.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(duplicate_or_db_error("create_team"))?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_team(&mut self, id: i64) -> Result<Option<Team>, TeamError> {
        let row: Option<TeamRecord> =
            sqlx::query_as(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?"))
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_error("find_team"))?;

        row.map(Team::try_from).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_team_by_owner_and_name(
        &mut self,
        owner_id: i64,
        name: &str,
    ) -> Result<Option<Team>, TeamError> {
        let row: Option<TeamRecord> = sqlx::query_as(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE owner_id = ? AND name = ?"
        ))
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("find_team_by_owner_and_name"))?;

        row.map(Team::try_from).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_teams_by_owner(
        &mut self,
        owner_id: i64,
        status: Option<TeamStatus>,
    ) -> Result<Vec<Team>, TeamError> {
        let rows: Vec<TeamRecord> = sqlx::query_as(&format!(
            r"
            SELECT {TEAM_COLUMNS} FROM teams
            WHERE owner_id = ? AND (? IS NULL OR status = ?)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(owner_id)
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("find_teams_by_owner"))?;

        rows.into_iter().map(Team::try_from).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_team_details(
        &mut self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, TeamError> {
        let row: Option<TeamRecord> = sqlx::query_as(&format!(
            r"
            UPDATE teams SET name = ?, description = ?, updated_at = ?
            WHERE id = ?
            RETURNING {TEAM_COLUMNS}
            "
        ))
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(duplicate_or_db_error("update_team_details"))?;

        row.ok_or_else(|| TeamError::not_found("team", id))?
            .try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn set_team_status(&mut self, id: i64, status: TeamStatus) -> Result<Team, TeamError> {
        let row: Option<TeamRecord> = sqlx::query_as(&format!(
            r"
            UPDATE teams SET status = ?, updated_at = ?
            WHERE id = ?
            RETURNING {TEAM_COLUMNS}
            "
        ))
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("set_team_status"))?;

        row.ok_or_else(|| TeamError::not_found("team", id))?
            .try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn increment_member_count(&mut self, id: i64, delta: i64) -> Result<Team, TeamError> {
        let row: Option<TeamRecord> = sqlx::query_as(&format!(
            r"
            UPDATE teams SET member_count = MAX(1, member_count + ?), updated_at = ?
            WHERE id = ?
            RETURNING {TEAM_COLUMNS}
            "
        ))
        .bind(delta)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("increment_member_count"))?;

        row.ok_or_else(|| TeamError::not_found("team", id))?
            .try_into()
    }
}
