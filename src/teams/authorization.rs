//! Read-only permission decisions over team and membership state.
//!
//! The free functions evaluate inside a caller's open transaction, so a
//! mutating operation checks permissions against the same snapshot it
//! writes to. [`Authorizer`] answers the same questions for callers that
//! hold no transaction.

use super::repository::{TeamMembershipRepository, TeamRepository};
use super::types::TeamRole;
use crate::TeamError;
use crate::store::Store;

/// True iff `user_id` has an `ACTIVE` membership in the team.
pub async fn is_member<T>(tx: &mut T, team_id: i64, user_id: i64) -> Result<bool, TeamError>
where
    T: TeamMembershipRepository,
{
    Ok(tx
        .find_membership_by_team_and_user(team_id, user_id)
        .await?
        .is_some_and(|m| m.is_active()))
}

/// True iff `user_id` has an `ACTIVE` membership whose role is in `roles`.
pub async fn has_any_role<T>(
    tx: &mut T,
    team_id: i64,
    user_id: i64,
    roles: &[TeamRole],
) -> Result<bool, TeamError>
where
    T: TeamMembershipRepository,
{
    Ok(tx
        .find_membership_by_team_and_user(team_id, user_id)
        .await?
        .is_some_and(|m| m.is_active() && roles.contains(&m.role)))
}

/// True iff `user_id` is an active `OWNER` or `ADMIN` of the team.
pub async fn has_manage_permission<T>(
    tx: &mut T,
    team_id: i64,
    user_id: i64,
) -> Result<bool, TeamError>
where
    T: TeamMembershipRepository,
{
    Ok(tx
        .find_membership_by_team_and_user(team_id, user_id)
        .await?
        .is_some_and(|m| m.is_active() && m.role.can_manage_members()))
}

/// True iff the team exists and `user_id` is its `owner_id`.
pub async fn is_owner<T>(tx: &mut T, team_id: i64, user_id: i64) -> Result<bool, TeamError>
where
    T: TeamRepository,
{
    Ok(tx
        .find_team(team_id)
        .await?
        .is_some_and(|t| t.owner_id == user_id))
}

/// Stateless permission checks on a fresh snapshot of the store.
#[derive(Clone)]
pub struct Authorizer<S: Store> {
    store: S,
}

impl<S: Store> Authorizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn is_member(&self, team_id: i64, user_id: i64) -> Result<bool, TeamError> {
        let mut tx = self.store.begin().await?;
        is_member(&mut tx, team_id, user_id).await
    }

    pub async fn has_manage_permission(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<bool, TeamError> {
        let mut tx = self.store.begin().await?;
        has_manage_permission(&mut tx, team_id, user_id).await
    }

    pub async fn has_any_role(
        &self,
        team_id: i64,
        user_id: i64,
        roles: &[TeamRole],
    ) -> Result<bool, TeamError> {
        let mut tx = self.store.begin().await?;
        has_any_role(&mut tx, team_id, user_id, roles).await
    }

    pub async fn is_owner(&self, team_id: i64, user_id: i64) -> Result<bool, TeamError> {
        let mut tx = self.store.begin().await?;
        is_owner(&mut tx, team_id, user_id).await
    }
}
