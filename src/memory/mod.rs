//! In-process backend for tests and development.
//!
//! The whole state sits behind one async mutex. A transaction holds the lock
//! for its lifetime and edits a private copy, which replaces the shared state
//! on commit. Dropping the transaction discards the copy, ids included.
//! Transactions are therefore fully serialized.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::comments::{Comment, CommentRepository, CommentStatus, CreateComment, DocumentCatalog};
use crate::store::{Store, StoreTransaction};
use crate::teams::{
    CreateMembership, CreateTeam, MemberStatus, Team, TeamMembership, TeamMembershipRepository,
    TeamRepository, TeamRole, TeamStatus,
};
use crate::users::{CreateUser, User, UserRepository};
use crate::validators::ValidationError;
use crate::TeamError;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    teams: BTreeMap<i64, Team>,
    memberships: BTreeMap<i64, TeamMembership>,
    comments: BTreeMap<i64, Comment>,
    users: BTreeMap<i64, User>,
    last_team_id: i64,
    last_membership_id: i64,
    last_comment_id: i64,
    last_user_id: i64,
}

/// Shared in-memory store. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, TeamError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTransaction { guard, working })
    }
}

/// Exclusive transaction over a [`MemoryStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self) -> Result<(), TeamError> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[async_trait]
impl TeamRepository for MemoryTransaction {
    async fn create_team(&mut self, data: CreateTeam) -> Result<Team, TeamError> {
        let state = &mut self.working;
        if state
            .teams
            .values()
            .any(|t| t.owner_id == data.owner_id && t.name == data.name)
        {
            return Err(ValidationError::DuplicateTeamName.into());
        }

        let now = Utc::now();
        let team = Team {
            id: next_id(&mut state.last_team_id),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            status: TeamStatus::Active,
            member_count: 1,
            created_at: now,
            updated_at: now,
        };
        state.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn find_team(&mut self, id: i64) -> Result<Option<Team>, TeamError> {
        Ok(self.working.teams.get(&id).cloned())
    }

    async fn find_team_by_owner_and_name(
        &mut self,
        owner_id: i64,
        name: &str,
    ) -> Result<Option<Team>, TeamError> {
        Ok(self
            .working
            .teams
            .values()
            .find(|t| t.owner_id == owner_id && t.name == name)
            .cloned())
    }

    async fn find_teams_by_owner(
        &mut self,
        owner_id: i64,
        status: Option<TeamStatus>,
    ) -> Result<Vec<Team>, TeamError> {
        let mut teams: Vec<Team> = self
            .working
            .teams
            .values()
            .filter(|t| t.owner_id == owner_id && status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        teams.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(teams)
    }

    async fn update_team_details(
        &mut self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, TeamError> {
        let state = &mut self.working;
        let owner_id = state
            .teams
            .get(&id)
            .map(|t| t.owner_id)
            .ok_or_else(|| TeamError::not_found("team", id))?;
        if state
            .teams
            .values()
            .any(|t| t.id != id && t.owner_id == owner_id && t.name == name)
        {
            return Err(ValidationError::DuplicateTeamName.into());
        }

        let team = state
            .teams
            .get_mut(&id)
            .ok_or_else(|| TeamError::not_found("team", id))?;
        name.clone_into(&mut team.name);
        team.description = description.map(str::to_owned);
        team.updated_at = Utc::now();
        Ok(team.clone())
    }

    async fn set_team_status(&mut self, id: i64, status: TeamStatus) -> Result<Team, TeamError> {
        let team = self
            .working
            .teams
            .get_mut(&id)
            .ok_or_else(|| TeamError::not_found("team", id))?;
        team.status = status;
        team.updated_at = Utc::now();
        Ok(team.clone())
    }

    async fn increment_member_count(&mut self, id: i64, delta: i64) -> Result<Team, TeamError> {
        let team = self
            .working
            .teams
            .get_mut(&id)
            .ok_or_else(|| TeamError::not_found("team", id))?;
        team.member_count = (team.member_count + delta).max(1);
        team.updated_at = Utc::now();
        Ok(team.clone())
    }
}

#[async_trait]
impl TeamMembershipRepository for MemoryTransaction {
    async fn create_membership(
        &mut self,
        data: CreateMembership,
    ) -> Result<TeamMembership, TeamError> {
        let state = &mut self.working;
        if state
            .memberships
            .values()
            .any(|m| m.team_id == data.team_id && m.user_id == data.user_id)
        {
            return Err(TeamError::InvalidState(format!(
                "user {} already has a membership row in team {}",
                data.user_id, data.team_id
            )));
        }

        let now = Utc::now();
        let membership = TeamMembership {
            id: next_id(&mut state.last_membership_id),
            team_id: data.team_id,
            user_id: data.user_id,
            role: data.role,
            status: MemberStatus::Active,
            joined_at: now,
            updated_at: now,
        };
        state.memberships.insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn find_membership(&mut self, id: i64) -> Result<Option<TeamMembership>, TeamError> {
        Ok(self.working.memberships.get(&id).cloned())
    }

    async fn find_membership_by_team_and_user(
        &mut self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMembership>, TeamError> {
        Ok(self
            .working
            .memberships
            .values()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_memberships_by_team(
        &mut self,
        team_id: i64,
        status: Option<MemberStatus>,
    ) -> Result<Vec<TeamMembership>, TeamError> {
        let mut memberships: Vec<TeamMembership> = self
            .working
            .memberships
            .values()
            .filter(|m| m.team_id == team_id && status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        memberships.sort_by_key(|m| (m.joined_at, m.id));
        Ok(memberships)
    }

    async fn update_membership_role(
        &mut self,
        id: i64,
        role: TeamRole,
    ) -> Result<TeamMembership, TeamError> {
        let membership = self.membership_mut(id)?;
        membership.role = role;
        membership.updated_at = Utc::now();
        Ok(membership.clone())
    }

    async fn update_membership_status(
        &mut self,
        id: i64,
        status: MemberStatus,
    ) -> Result<TeamMembership, TeamError> {
        let membership = self.membership_mut(id)?;
        membership.status = status;
        membership.updated_at = Utc::now();
        Ok(membership.clone())
    }

    async fn reactivate_membership(
        &mut self,
        id: i64,
        role: TeamRole,
    ) -> Result<TeamMembership, TeamError> {
        let membership = self.membership_mut(id)?;
        membership.role = role;
        membership.status = MemberStatus::Active;
        membership.updated_at = Utc::now();
        Ok(membership.clone())
    }
}

impl MemoryTransaction {
    fn membership_mut(&mut self, id: i64) -> Result<&mut TeamMembership, TeamError> {
        self.working
            .memberships
            .get_mut(&id)
            .ok_or_else(|| TeamError::not_found("membership", id))
    }

    fn comment_mut(&mut self, id: i64) -> Result<&mut Comment, TeamError> {
        self.working
            .comments
            .get_mut(&id)
            .ok_or_else(|| TeamError::not_found("comment", id))
    }
}

#[async_trait]
impl CommentRepository for MemoryTransaction {
    async fn create_comment(&mut self, data: CreateComment) -> Result<Comment, TeamError> {
        let state = &mut self.working;
        let now = Utc::now();
        let comment = Comment {
            id: next_id(&mut state.last_comment_id),
            document_id: data.document_id,
            author_user_id: data.author_user_id,
            team_id: data.team_id,
            content: data.content,
            parent_comment_id: data.parent_comment_id,
            status: CommentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&mut self, id: i64) -> Result<Option<Comment>, TeamError> {
        Ok(self.working.comments.get(&id).cloned())
    }

    async fn find_comments_by_document(
        &mut self,
        document_id: i64,
        team_id: Option<i64>,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, TeamError> {
        let mut comments: Vec<Comment> = self
            .working
            .comments
            .values()
            .filter(|c| {
                c.document_id == document_id
                    && c.status == status
                    && team_id.map_or(true, |t| c.team_id == Some(t))
            })
            .cloned()
            .collect();
        comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(comments)
    }

    async fn find_replies(
        &mut self,
        parent_comment_id: i64,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, TeamError> {
        let mut replies: Vec<Comment> = self
            .working
            .comments
            .values()
            .filter(|c| c.parent_comment_id == Some(parent_comment_id) && c.status == status)
            .cloned()
            .collect();
        replies.sort_by_key(|c| (c.created_at, c.id));
        Ok(replies)
    }

    async fn update_comment_content(
        &mut self,
        id: i64,
        content: &str,
    ) -> Result<Comment, TeamError> {
        let comment = self.comment_mut(id)?;
        content.clone_into(&mut comment.content);
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn set_comment_status(
        &mut self,
        id: i64,
        status: CommentStatus,
    ) -> Result<Comment, TeamError> {
        let comment = self.comment_mut(id)?;
        comment.status = status;
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryTransaction {
    async fn create_user(&mut self, data: CreateUser) -> Result<User, TeamError> {
        let state = &mut self.working;
        if state
            .users
            .values()
            .any(|u| u.external_id == data.external_id)
        {
            return Err(TeamError::InvalidState(format!(
                "external id {} is already registered",
                data.external_id
            )));
        }

        let now = Utc::now();
        let user = User {
            id: next_id(&mut state.last_user_id),
            external_id: data.external_id,
            username: data.username,
            email: data.email,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, id: i64) -> Result<Option<User>, TeamError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_external_id(
        &mut self,
        external_id: &str,
    ) -> Result<Option<User>, TeamError> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn update_user_profile(
        &mut self,
        id: i64,
        username: &str,
        email: Option<&str>,
    ) -> Result<User, TeamError> {
        let user = self
            .working
            .users
            .get_mut(&id)
            .ok_or_else(|| TeamError::not_found("user", id))?;
        username.clone_into(&mut user.username);
        user.email = email.map(str::to_owned);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

/// Set of known document ids. Clones share the same set.
#[derive(Clone, Default)]
pub struct MemoryDocumentCatalog {
    documents: Arc<RwLock<HashSet<i64>>>,
}

impl MemoryDocumentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&self, document_id: i64) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document_id);
    }

    pub fn remove_document(&self, document_id: i64) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&document_id);
    }
}

#[async_trait]
impl DocumentCatalog for MemoryDocumentCatalog {
    async fn document_exists(&self, document_id: i64) -> Result<bool, TeamError> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&document_id))
    }
}
