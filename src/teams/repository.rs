use async_trait::async_trait;

use super::types::{MemberStatus, Team, TeamMembership, TeamRole, TeamStatus};
use crate::TeamError;

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamRole,
}

/// Row access for teams, scoped to one store transaction.
#[async_trait]
pub trait TeamRepository: Send {
    /// Inserts an `ACTIVE` team with `member_count = 1`.
    async fn create_team(&mut self, data: CreateTeam) -> Result<Team, TeamError>;
    async fn find_team(&mut self, id: i64) -> Result<Option<Team>, TeamError>;
    async fn find_team_by_owner_and_name(
        &mut self,
        owner_id: i64,
        name: &str,
    ) -> Result<Option<Team>, TeamError>;
    /// Newest first. `status = None` returns teams in every state.
    async fn find_teams_by_owner(
        &mut self,
        owner_id: i64,
        status: Option<TeamStatus>,
    ) -> Result<Vec<Team>, TeamError>;
    async fn update_team_details(
        &mut self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, TeamError>;
    async fn set_team_status(&mut self, id: i64, status: TeamStatus) -> Result<Team, TeamError>;
    /// Adds `delta` to the stored counter in a single statement, floored at 1.
    async fn increment_member_count(&mut self, id: i64, delta: i64) -> Result<Team, TeamError>;
}

/// Row access for memberships, scoped to one store transaction.
#[async_trait]
pub trait TeamMembershipRepository: Send {
    /// Inserts an `ACTIVE` membership.
    async fn create_membership(&mut self, data: CreateMembership)
        -> Result<TeamMembership, TeamError>;
    async fn find_membership(&mut self, id: i64) -> Result<Option<TeamMembership>, TeamError>;
    async fn find_membership_by_team_and_user(
        &mut self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMembership>, TeamError>;
    /// Oldest first. `status = None` returns rows in every state.
    async fn find_memberships_by_team(
        &mut self,
        team_id: i64,
        status: Option<MemberStatus>,
    ) -> Result<Vec<TeamMembership>, TeamError>;
    async fn update_membership_role(
        &mut self,
        id: i64,
        role: TeamRole,
    ) -> Result<TeamMembership, TeamError>;
    async fn update_membership_status(
        &mut self,
        id: i64,
        status: MemberStatus,
    ) -> Result<TeamMembership, TeamError>;
    /// Sets `status = ACTIVE` and the given role on an existing row.
    async fn reactivate_membership(
        &mut self,
        id: i64,
        role: TeamRole,
    ) -> Result<TeamMembership, TeamError>;
}
