use std::sync::Arc;

use chrono::Utc;

use super::authorization;
use super::membership::insert_owner_membership;
use super::repository::{CreateTeam, TeamRepository};
use super::types::{Team, TeamStatus};
use crate::config::TeamsConfig;
use crate::events::{EventRegistry, TeamEvent};
use crate::store::{Store, StoreTransaction};
use crate::validators::{validate_description, validate_team_name, ValidationError};
use crate::TeamError;

/// Owns the team lifecycle: creation, rename, soft-delete.
///
/// `status` and `member_count` are written only from here. Membership
/// changes adjust the counter through [`adjust_member_count`] inside their
/// own transaction.
pub struct TeamRegistry<S: Store> {
    store: S,
    events: Arc<EventRegistry>,
    config: TeamsConfig,
}

impl<S: Store> TeamRegistry<S> {
    /// Creates a new `TeamRegistry` with default configuration.
    pub fn new(store: S, events: Arc<EventRegistry>) -> Self {
        Self::with_config(store, events, TeamsConfig::default())
    }

    pub fn with_config(store: S, events: Arc<EventRegistry>, config: TeamsConfig) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// Creates a team together with its owner membership.
    ///
    /// Both rows are written in one transaction; if either write fails,
    /// neither is visible.
    ///
    /// # Returns
    ///
    /// - `Ok(team)` - `member_count == 1`, one `ACTIVE` `OWNER` membership for `owner_id`
    /// - `Err(TeamError::Validation(_))` - Blank/over-length name or description,
    ///   or the owner already has a team with this name
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_team", skip_all, err)
    )]
    pub async fn create_team(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: i64,
    ) -> Result<Team, TeamError> {
        let name = validate_team_name(
            name,
            self.config.name_min_length,
            self.config.name_max_length,
        )?;
        let description = validate_description(description, self.config.description_max_length)?;

        let mut tx = self.store.begin().await?;

        if tx
            .find_team_by_owner_and_name(owner_id, name)
            .await?
            .is_some()
        {
            log::warn!(
                target: "doc_teams",
                "msg=\"duplicate team name\", owner_id={owner_id}, name=\"{name}\""
            );
            return Err(ValidationError::DuplicateTeamName.into());
        }

        let team = tx
            .create_team(CreateTeam {
                name: name.to_owned(),
                description,
                owner_id,
            })
            .await?;
        let owner = insert_owner_membership(&mut tx, &team).await?;

        tx.commit().await?;

        log::info!(
            target: "doc_teams",
            "msg=\"team created\", team_id={}, owner_id={}, membership_id={}",
            team.id,
            team.owner_id,
            owner.id
        );

        self.events
            .dispatch(TeamEvent::TeamCreated {
                team_id: team.id,
                owner_id: team.owner_id,
                name: team.name.clone(),
                at: Utc::now(),
            })
            .await;

        Ok(team)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_team_by_id", skip_all, err)
    )]
    pub async fn get_team_by_id(&self, team_id: i64) -> Result<Team, TeamError> {
        let mut tx = self.store.begin().await?;
        tx.find_team(team_id)
            .await?
            .ok_or_else(|| TeamError::not_found("team", team_id))
    }

    /// Teams owned by `owner_id`, newest first.
    pub async fn list_owned_teams(
        &self,
        owner_id: i64,
        active_only: bool,
    ) -> Result<Vec<Team>, TeamError> {
        let status = active_only.then_some(TeamStatus::Active);
        let mut tx = self.store.begin().await?;
        tx.find_teams_by_owner(owner_id, status).await
    }

    /// Renames a team and replaces its description.
    ///
    /// # Returns
    ///
    /// - `Ok(team)` - The updated team
    /// - `Err(TeamError::NotFound(_))` - Team does not exist
    /// - `Err(TeamError::PermissionDenied(_))` - Actor is not the owner
    /// - `Err(TeamError::Validation(_))` - Invalid input, or the new name
    ///   collides with another team of the same owner
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_team", skip_all, err)
    )]
    pub async fn update_team(
        &self,
        team_id: i64,
        name: &str,
        description: Option<&str>,
        acting_user_id: i64,
    ) -> Result<Team, TeamError> {
        let name = validate_team_name(
            name,
            self.config.name_min_length,
            self.config.name_max_length,
        )?;
        let description = validate_description(description, self.config.description_max_length)?;

        let mut tx = self.store.begin().await?;

        let team = tx
            .find_team(team_id)
            .await?
            .ok_or_else(|| TeamError::not_found("team", team_id))?;

        if !authorization::is_owner(&mut tx, team_id, acting_user_id).await? {
            log::warn!(
                target: "doc_teams",
                "msg=\"update denied\", team_id={team_id}, actor_id={acting_user_id}"
            );
            return Err(TeamError::PermissionDenied(
                "only the team owner can update the team".to_owned(),
            ));
        }

        if team.name != name {
            let clash = tx.find_team_by_owner_and_name(team.owner_id, name).await?;
            if clash.is_some_and(|other| other.id != team_id) {
                return Err(ValidationError::DuplicateTeamName.into());
            }
        }

        let updated = tx
            .update_team_details(team_id, name, description.as_deref())
            .await?;
        tx.commit().await?;

        log::info!(target: "doc_teams", "msg=\"team updated\", team_id={team_id}");

        self.events
            .dispatch(TeamEvent::TeamUpdated {
                team_id,
                actor_id: acting_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(updated)
    }

    /// Marks a team `DELETED`. Memberships are left untouched.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_team", skip_all, err)
    )]
    pub async fn delete_team(&self, team_id: i64, acting_user_id: i64) -> Result<(), TeamError> {
        let mut tx = self.store.begin().await?;

        if tx.find_team(team_id).await?.is_none() {
            return Err(TeamError::not_found("team", team_id));
        }

        if !authorization::is_owner(&mut tx, team_id, acting_user_id).await? {
            log::warn!(
                target: "doc_teams",
                "msg=\"delete denied\", team_id={team_id}, actor_id={acting_user_id}"
            );
            return Err(TeamError::PermissionDenied(
                "only the team owner can delete the team".to_owned(),
            ));
        }

        tx.set_team_status(team_id, TeamStatus::Deleted).await?;
        tx.commit().await?;

        log::info!(target: "doc_teams", "msg=\"team deleted\", team_id={team_id}");

        self.events
            .dispatch(TeamEvent::TeamDeleted {
                team_id,
                actor_id: acting_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(())
    }
}

/// Applies `delta` to the team's member counter, floored at 1.
///
/// Only called by membership operations, inside their transaction.
pub(crate) async fn adjust_member_count<T>(
    tx: &mut T,
    team_id: i64,
    delta: i64,
) -> Result<Team, TeamError>
where
    T: TeamRepository,
{
    let team = tx.increment_member_count(team_id, delta).await?;
    log::debug!(
        target: "doc_teams",
        "msg=\"member count adjusted\", team_id={team_id}, delta={delta}, member_count={}",
        team.member_count
    );
    Ok(team)
}
