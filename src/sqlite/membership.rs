//! `SQLite` implementation of [`TeamMembershipRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{corrupt_column, db_error, is_unique_violation, SqliteTransaction};
use crate::teams::{
    CreateMembership, MemberStatus, TeamMembership, TeamMembershipRepository, TeamRole,
};
use crate::TeamError;

#[derive(FromRow)]
struct MembershipRecord {
    id: i64,
    team_id: i64,
    user_id: i64,
    role: String,
    status: String,
    joined_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MembershipRecord> for TeamMembership {
    type Error = TeamError;

    fn try_from(row: MembershipRecord) -> Result<Self, Self::Error> {
        let role = TeamRole::parse(&row.role)
            .map_err(|_| corrupt_column("team_memberships.role", &row.role))?;
        let status = MemberStatus::parse(&row.status)
            .ok_or_else(|| corrupt_column("team_memberships.status", &row.status))?;
        Ok(TeamMembership {
            id: row.id,
            team_id: row.team_id,
            user_id: row.user_id,
            role,
            status,
            joined_at: row.joined_at,
            updated_at: row.updated_at,
        })
    }
}

impl SqliteTransaction {
    /// Shared `UPDATE ... RETURNING` for role and status changes.
    async fn update_membership(
        &mut self,
        id: i64,
        role: Option<TeamRole>,
        status: Option<MemberStatus>,
        operation: &'static str,
    ) -> Result<TeamMembership, TeamError> {
        let row: Option<MembershipRecord> = sqlx::query_as(
            r"
            UPDATE team_memberships
            SET role = COALESCE(?, role), status = COALESCE(?, status), updated_at = ?
            WHERE id = ?
            RETURNING id, team_id, user_id, role, status, joined_at, updated_at
            ",
        )
        .bind(role.map(|r| r.as_str()))
        .bind(status.map(|s| s.as_str()))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error(operation))?;

        row.ok_or_else(|| TeamError::not_found("membership", id))?
            .try_into()
    }
}

#[async_trait]
impl TeamMembershipRepository for SqliteTransaction {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_membership(
        &mut self,
        data: CreateMembership,
    ) -> Result<TeamMembership, TeamError> {
        let now = Utc::now();

        let row: MembershipRecord = sqlx::query_as(
            r"
            INSERT INTO team_memberships (team_id, user_id, role, status, joined_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, team_id, user_id, role, status, joined_at, updated_at
            ",
        )
        .bind(data.team_id)
        .bind(data.user_id)
        .bind(data.role.as_str())
        .bind(MemberStatus::Active.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TeamError::InvalidState(format!(
                    "user {} already has a membership row in team {}",
                    data.user_id, data.team_id
                ))
            } else {
                db_error("create_membership")(e)
            }
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_membership(&mut self, id: i64) -> Result<Option<TeamMembership>, TeamError> {
        let row: Option<MembershipRecord> = sqlx::query_as(
            "SELECT id, team_id, user_id, role, status, joined_at, updated_at FROM team_memberships WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("find_membership"))?;

        row.map(TeamMembership::try_from).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_membership_by_team_and_user(
        &mut self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMembership>, TeamError> {
        let row: Option<MembershipRecord> = sqlx::query_as(
            "SELECT id, team_id, user_id, role, status, joined_at, updated_at FROM team_memberships WHERE team_id = ? AND user_id = ?",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("find_membership_by_team_and_user"))?;

        row.map(TeamMembership::try_from).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_memberships_by_team(
        &mut self,
        team_id: i64,
        status: Option<MemberStatus>,
    ) -> Result<Vec<TeamMembership>, TeamError> {
        let rows: Vec<MembershipRecord> = sqlx::query_as(
            r"
            SELECT id, team_id, user_id, role, status, joined_at, updated_at FROM team_memberships
            WHERE team_id = ? AND (? IS NULL OR status = ?)
            ORDER BY joined_at ASC, id ASC
            ",
        )
        .bind(team_id)
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("find_memberships_by_team"))?;

        rows.into_iter().map(TeamMembership::try_from).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_membership_role(
        &mut self,
        id: i64,
        role: TeamRole,
    ) -> Result<TeamMembership, TeamError> {
        self.update_membership(id, Some(role), None, "update_membership_role")
            .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_membership_status(
        &mut self,
        id: i64,
        status: MemberStatus,
    ) -> Result<TeamMembership, TeamError> {
        self.update_membership(id, None, Some(status), "update_membership_status")
            .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn reactivate_membership(
        &mut self,
        id: i64,
        role: TeamRole,
    ) -> Result<TeamMembership, TeamError> {
        self.update_membership(
            id,
            Some(role),
            Some(MemberStatus::Active),
            "reactivate_membership",
        )
        .await
    }
}
