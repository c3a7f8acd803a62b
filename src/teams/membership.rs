use std::sync::Arc;

use chrono::Utc;

use super::authorization;
use super::registry::adjust_member_count;
use super::repository::{CreateMembership, TeamMembershipRepository, TeamRepository};
use super::types::{MemberStatus, Team, TeamMembership, TeamRole};
use crate::events::{EventRegistry, TeamEvent};
use crate::store::{Store, StoreTransaction};
use crate::TeamError;

/// Membership lifecycle: add, reactivate, remove, leave, role change.
///
/// Every mutation runs in one store transaction together with the matching
/// `member_count` adjustment, so concurrent calls against the same team
/// never lose an update.
pub struct MembershipStore<S: Store> {
    store: S,
    events: Arc<EventRegistry>,
}

impl<S: Store> MembershipStore<S> {
    pub fn new(store: S, events: Arc<EventRegistry>) -> Self {
        Self { store, events }
    }

    /// Adds `target_user_id` to the team, or reactivates their removed row.
    ///
    /// # Returns
    ///
    /// - `Ok(membership)` - Active membership; the row id is reused on reactivation
    /// - `Err(TeamError::Validation(_))` - `role` is not a known role
    /// - `Err(TeamError::NotFound(_))` - Team does not exist
    /// - `Err(TeamError::InvalidState(_))` - Team is not active, the target is
    ///   already an active member, or `role` is `OWNER`
    /// - `Err(TeamError::PermissionDenied(_))` - Actor is not an active owner or admin
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "add_member", skip_all, err)
    )]
    pub async fn add_member(
        &self,
        team_id: i64,
        target_user_id: i64,
        role: &str,
        acting_user_id: i64,
    ) -> Result<TeamMembership, TeamError> {
        let role = TeamRole::parse(role)?;

        let mut tx = self.store.begin().await?;

        let team = find_team(&mut tx, team_id).await?;
        if !team.is_active() {
            return Err(TeamError::InvalidState(format!(
                "team {team_id} is {}",
                team.status.as_str()
            )));
        }

        if !authorization::has_manage_permission(&mut tx, team_id, acting_user_id).await? {
            log::warn!(
                target: "doc_teams",
                "msg=\"add member denied\", team_id={team_id}, actor_id={acting_user_id}"
            );
            return Err(TeamError::PermissionDenied(
                "managing members requires the OWNER or ADMIN role".to_owned(),
            ));
        }

        if role == TeamRole::Owner {
            return Err(TeamError::InvalidState(
                "a team has exactly one owner".to_owned(),
            ));
        }

        let existing = tx
            .find_membership_by_team_and_user(team_id, target_user_id)
            .await?;

        let (membership, reactivated) = match existing {
            Some(m) if m.is_active() => {
                return Err(TeamError::InvalidState(format!(
                    "user {target_user_id} is already a member of team {team_id}"
                )));
            }
            Some(m) => (tx.reactivate_membership(m.id, role).await?, true),
            None => (
                tx.create_membership(CreateMembership {
                    team_id,
                    user_id: target_user_id,
                    role,
                })
                .await?,
                false,
            ),
        };
        adjust_member_count(&mut tx, team_id, 1).await?;

        tx.commit().await?;

        log::info!(
            target: "doc_teams",
            "msg=\"member added\", team_id={team_id}, user_id={target_user_id}, membership_id={}, role={role}, reactivated={reactivated}",
            membership.id
        );

        self.events
            .dispatch(TeamEvent::MemberAdded {
                team_id,
                user_id: target_user_id,
                membership_id: membership.id,
                role,
                reactivated,
                actor_id: acting_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(membership)
    }

    /// Marks a membership `REMOVED`. The owner's row can never be removed.
    ///
    /// Permission is checked before the team is looked up, so an unknown
    /// `team_id` yields `PermissionDenied` rather than `NotFound`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "remove_member", skip_all, err)
    )]
    pub async fn remove_member(
        &self,
        team_id: i64,
        membership_id: i64,
        acting_user_id: i64,
    ) -> Result<(), TeamError> {
        let mut tx = self.store.begin().await?;

        if !authorization::has_manage_permission(&mut tx, team_id, acting_user_id).await? {
            log::warn!(
                target: "doc_teams",
                "msg=\"remove member denied\", team_id={team_id}, actor_id={acting_user_id}"
            );
            return Err(TeamError::PermissionDenied(
                "managing members requires the OWNER or ADMIN role".to_owned(),
            ));
        }

        let membership = find_team_membership(&mut tx, team_id, membership_id).await?;
        if membership.role == TeamRole::Owner {
            return Err(TeamError::InvalidState("cannot remove the owner".to_owned()));
        }
        if !membership.is_active() {
            return Err(TeamError::InvalidState(format!(
                "membership {membership_id} is not active"
            )));
        }

        tx.update_membership_status(membership_id, MemberStatus::Removed)
            .await?;
        adjust_member_count(&mut tx, team_id, -1).await?;

        tx.commit().await?;

        log::info!(
            target: "doc_teams",
            "msg=\"member removed\", team_id={team_id}, membership_id={membership_id}, user_id={}",
            membership.user_id
        );

        self.events
            .dispatch(TeamEvent::MemberRemoved {
                team_id,
                user_id: membership.user_id,
                membership_id,
                actor_id: acting_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(())
    }

    /// Changes a member's role. Only the team owner may do this, and neither
    /// the current nor the new role may be `OWNER`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_member_role", skip_all, err)
    )]
    pub async fn update_member_role(
        &self,
        team_id: i64,
        membership_id: i64,
        new_role: &str,
        acting_user_id: i64,
    ) -> Result<TeamMembership, TeamError> {
        let new_role = TeamRole::parse(new_role)?;

        let mut tx = self.store.begin().await?;

        find_team(&mut tx, team_id).await?;

        if !authorization::is_owner(&mut tx, team_id, acting_user_id).await? {
            log::warn!(
                target: "doc_teams",
                "msg=\"role change denied\", team_id={team_id}, actor_id={acting_user_id}"
            );
            return Err(TeamError::PermissionDenied(
                "only the team owner can change member roles".to_owned(),
            ));
        }

        let membership = find_team_membership(&mut tx, team_id, membership_id).await?;
        if membership.role == TeamRole::Owner {
            return Err(TeamError::InvalidState(
                "the owner's role cannot be changed".to_owned(),
            ));
        }
        if new_role == TeamRole::Owner {
            return Err(TeamError::InvalidState(
                "ownership cannot be assigned through a role change".to_owned(),
            ));
        }

        let old_role = membership.role;
        let updated = tx.update_membership_role(membership_id, new_role).await?;

        tx.commit().await?;

        log::info!(
            target: "doc_teams",
            "msg=\"member role changed\", team_id={team_id}, membership_id={membership_id}, old_role={old_role}, new_role={new_role}"
        );

        self.events
            .dispatch(TeamEvent::MemberRoleChanged {
                team_id,
                membership_id,
                old_role,
                new_role,
                actor_id: acting_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(updated)
    }

    /// Removes the caller's own membership.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "leave_team", skip_all, err)
    )]
    pub async fn leave_team(&self, team_id: i64, acting_user_id: i64) -> Result<(), TeamError> {
        let mut tx = self.store.begin().await?;

        find_team(&mut tx, team_id).await?;

        let membership = tx
            .find_membership_by_team_and_user(team_id, acting_user_id)
            .await?
            .ok_or_else(|| {
                TeamError::NotFound(format!(
                    "membership of user {acting_user_id} in team {team_id}"
                ))
            })?;

        if membership.role == TeamRole::Owner {
            return Err(TeamError::InvalidState(
                "owner cannot leave, transfer or delete the team first".to_owned(),
            ));
        }
        if !membership.is_active() {
            return Err(TeamError::InvalidState(format!(
                "user {acting_user_id} is not an active member of team {team_id}"
            )));
        }

        tx.update_membership_status(membership.id, MemberStatus::Removed)
            .await?;
        adjust_member_count(&mut tx, team_id, -1).await?;

        tx.commit().await?;

        log::info!(
            target: "doc_teams",
            "msg=\"member left\", team_id={team_id}, user_id={acting_user_id}, membership_id={}",
            membership.id
        );

        self.events
            .dispatch(TeamEvent::MemberLeft {
                team_id,
                user_id: acting_user_id,
                membership_id: membership.id,
                at: Utc::now(),
            })
            .await;

        Ok(())
    }

    /// Memberships of a team, oldest first. The caller must be an active member.
    pub async fn list_members(
        &self,
        team_id: i64,
        acting_user_id: i64,
        active_only: bool,
    ) -> Result<Vec<TeamMembership>, TeamError> {
        let mut tx = self.store.begin().await?;

        if !authorization::is_member(&mut tx, team_id, acting_user_id).await? {
            return Err(TeamError::PermissionDenied(format!(
                "user {acting_user_id} is not a member of team {team_id}"
            )));
        }

        let status = active_only.then_some(MemberStatus::Active);
        tx.find_memberships_by_team(team_id, status).await
    }
}

/// Writes the owner's membership for a freshly inserted team.
///
/// The counter already starts at 1, so no adjustment follows.
pub(crate) async fn insert_owner_membership<T>(
    tx: &mut T,
    team: &Team,
) -> Result<TeamMembership, TeamError>
where
    T: TeamMembershipRepository,
{
    tx.create_membership(CreateMembership {
        team_id: team.id,
        user_id: team.owner_id,
        role: TeamRole::Owner,
    })
    .await
}

async fn find_team<T: TeamRepository>(tx: &mut T, team_id: i64) -> Result<Team, TeamError> {
    tx.find_team(team_id)
        .await?
        .ok_or_else(|| TeamError::not_found("team", team_id))
}

/// A membership that exists and belongs to `team_id`.
async fn find_team_membership<T: TeamMembershipRepository>(
    tx: &mut T,
    team_id: i64,
    membership_id: i64,
) -> Result<TeamMembership, TeamError> {
    tx.find_membership(membership_id)
        .await?
        .filter(|m| m.team_id == team_id)
        .ok_or_else(|| TeamError::not_found("membership", membership_id))
}
