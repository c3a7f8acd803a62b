use std::sync::Arc;

use chrono::Utc;

use super::catalog::DocumentCatalog;
use super::repository::{CommentRepository, CreateComment};
use super::types::{Comment, CommentStatus, NewComment};
use crate::config::TeamsConfig;
use crate::events::{EventRegistry, TeamEvent};
use crate::store::{Store, StoreTransaction};
use crate::teams::authorization;
use crate::teams::{TeamRepository, TeamRole};
use crate::validators::{validate_comment_content, ValidationError};
use crate::TeamError;

const MODERATOR_ROLES: [TeamRole; 2] = [TeamRole::Owner, TeamRole::Admin];

/// Team-gated comments on documents.
///
/// A comment with a `team_id` is visible to and writable by active members
/// of that team only. Owners and admins of the team may delete any comment
/// in it.
pub struct CommentGateway<S: Store, D: DocumentCatalog> {
    store: S,
    documents: D,
    events: Arc<EventRegistry>,
    config: TeamsConfig,
}

impl<S: Store, D: DocumentCatalog> CommentGateway<S, D> {
    pub fn new(store: S, documents: D, events: Arc<EventRegistry>) -> Self {
        Self::with_config(store, documents, events, TeamsConfig::default())
    }

    pub fn with_config(
        store: S,
        documents: D,
        events: Arc<EventRegistry>,
        config: TeamsConfig,
    ) -> Self {
        Self {
            store,
            documents,
            events,
            config,
        }
    }

    /// Posts a comment, optionally scoped to a team and replying to a parent.
    ///
    /// # Returns
    ///
    /// - `Ok(comment)` - The stored `ACTIVE` comment
    /// - `Err(TeamError::Validation(_))` - Blank or over-length content, or a
    ///   parent that is missing or on another document
    /// - `Err(TeamError::NotFound(_))` - Document or team does not exist
    /// - `Err(TeamError::PermissionDenied(_))` - Author is not an active member of the team
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_comment", skip_all, err)
    )]
    pub async fn create_comment(
        &self,
        input: NewComment,
        author_user_id: i64,
    ) -> Result<Comment, TeamError> {
        validate_comment_content(&input.content, self.config.comment_max_length)?;
        self.require_document(input.document_id).await?;

        let mut tx = self.store.begin().await?;

        if let Some(team_id) = input.team_id {
            if tx.find_team(team_id).await?.is_none() {
                return Err(TeamError::not_found("team", team_id));
            }
            if !authorization::is_member(&mut tx, team_id, author_user_id).await? {
                log::warn!(
                    target: "doc_teams",
                    "msg=\"comment denied\", team_id={team_id}, author_id={author_user_id}"
                );
                return Err(TeamError::PermissionDenied(format!(
                    "user {author_user_id} is not a member of team {team_id}"
                )));
            }
        }

        if let Some(parent_id) = input.parent_comment_id {
            let parent = tx
                .find_comment(parent_id)
                .await?
                .ok_or(ValidationError::ParentCommentNotFound)?;
            if parent.document_id != input.document_id {
                return Err(ValidationError::ParentOnDifferentDocument.into());
            }
        }

        let comment = tx
            .create_comment(CreateComment {
                document_id: input.document_id,
                team_id: input.team_id,
                author_user_id,
                content: input.content.trim().to_owned(),
                parent_comment_id: input.parent_comment_id,
            })
            .await?;

        tx.commit().await?;

        log::info!(
            target: "doc_teams",
            "msg=\"comment created\", comment_id={}, document_id={}, author_id={author_user_id}",
            comment.id,
            comment.document_id
        );

        self.events
            .dispatch(TeamEvent::CommentCreated {
                comment_id: comment.id,
                document_id: comment.document_id,
                team_id: comment.team_id,
                author_id: author_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(comment)
    }

    pub async fn get_comment(&self, comment_id: i64) -> Result<Comment, TeamError> {
        let mut tx = self.store.begin().await?;
        find_comment(&mut tx, comment_id).await
    }

    /// Replaces the content of an active comment. Only its author may edit it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_comment", skip_all, err)
    )]
    pub async fn update_comment(
        &self,
        comment_id: i64,
        content: &str,
        acting_user_id: i64,
    ) -> Result<Comment, TeamError> {
        validate_comment_content(content, self.config.comment_max_length)?;

        let mut tx = self.store.begin().await?;

        let comment = find_comment(&mut tx, comment_id).await?;
        if comment.author_user_id != acting_user_id {
            log::warn!(
                target: "doc_teams",
                "msg=\"comment edit denied\", comment_id={comment_id}, actor_id={acting_user_id}"
            );
            return Err(TeamError::PermissionDenied(
                "only the author can edit a comment".to_owned(),
            ));
        }
        if !comment.is_active() {
            return Err(TeamError::InvalidState(format!(
                "comment {comment_id} is {}",
                comment.status.as_str()
            )));
        }

        let updated = tx.update_comment_content(comment_id, content.trim()).await?;
        tx.commit().await?;

        log::info!(target: "doc_teams", "msg=\"comment updated\", comment_id={comment_id}");

        self.events
            .dispatch(TeamEvent::CommentUpdated {
                comment_id,
                actor_id: acting_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(updated)
    }

    /// Soft-deletes a comment. Replies are left in place.
    ///
    /// Allowed for the author, and for an active owner or admin of the
    /// comment's team.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_comment", skip_all, err)
    )]
    pub async fn delete_comment(&self, comment_id: i64, acting_user_id: i64) -> Result<(), TeamError> {
        let mut tx = self.store.begin().await?;

        let comment = find_comment(&mut tx, comment_id).await?;

        let allowed = comment.author_user_id == acting_user_id
            || match comment.team_id {
                Some(team_id) => {
                    authorization::has_any_role(&mut tx, team_id, acting_user_id, &MODERATOR_ROLES)
                        .await?
                }
                None => false,
            };
        if !allowed {
            log::warn!(
                target: "doc_teams",
                "msg=\"comment delete denied\", comment_id={comment_id}, actor_id={acting_user_id}"
            );
            return Err(TeamError::PermissionDenied(
                "only the author or a team owner or admin can delete a comment".to_owned(),
            ));
        }

        tx.set_comment_status(comment_id, CommentStatus::Deleted)
            .await?;
        tx.commit().await?;

        log::info!(
            target: "doc_teams",
            "msg=\"comment deleted\", comment_id={comment_id}, actor_id={acting_user_id}"
        );

        self.events
            .dispatch(TeamEvent::CommentDeleted {
                comment_id,
                actor_id: acting_user_id,
                at: Utc::now(),
            })
            .await;

        Ok(())
    }

    /// Active comments on a document, newest first.
    ///
    /// With a `team_id`, only that team's comments are returned. The team
    /// must exist (`NotFound`) and the requester must be an active member
    /// (`PermissionDenied`).
    pub async fn list_comments(
        &self,
        document_id: i64,
        team_id: Option<i64>,
        requesting_user_id: i64,
    ) -> Result<Vec<Comment>, TeamError> {
        self.require_document(document_id).await?;

        let mut tx = self.store.begin().await?;

        if let Some(team_id) = team_id {
            if tx.find_team(team_id).await?.is_none() {
                return Err(TeamError::not_found("team", team_id));
            }
            if !authorization::is_member(&mut tx, team_id, requesting_user_id).await? {
                return Err(TeamError::PermissionDenied(format!(
                    "user {requesting_user_id} is not a member of team {team_id}"
                )));
            }
        }

        tx.find_comments_by_document(document_id, team_id, CommentStatus::Active)
            .await
    }

    /// Active replies to a comment, oldest first.
    pub async fn list_replies(&self, comment_id: i64) -> Result<Vec<Comment>, TeamError> {
        let mut tx = self.store.begin().await?;
        find_comment(&mut tx, comment_id).await?;
        tx.find_replies(comment_id, CommentStatus::Active).await
    }

    async fn require_document(&self, document_id: i64) -> Result<(), TeamError> {
        if self.documents.document_exists(document_id).await? {
            Ok(())
        } else {
            Err(TeamError::not_found("document", document_id))
        }
    }
}

async fn find_comment<T: CommentRepository>(tx: &mut T, comment_id: i64) -> Result<Comment, TeamError> {
    tx.find_comment(comment_id)
        .await?
        .ok_or_else(|| TeamError::not_found("comment", comment_id))
}
