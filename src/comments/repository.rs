use async_trait::async_trait;

use super::types::{Comment, CommentStatus};
use crate::TeamError;

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub document_id: i64,
    pub team_id: Option<i64>,
    pub author_user_id: i64,
    pub content: String,
    pub parent_comment_id: Option<i64>,
}

/// Row access for comments, scoped to one store transaction.
#[async_trait]
pub trait CommentRepository: Send {
    /// Inserts an `ACTIVE` comment.
    async fn create_comment(&mut self, data: CreateComment) -> Result<Comment, TeamError>;
    async fn find_comment(&mut self, id: i64) -> Result<Option<Comment>, TeamError>;
    /// Newest first. With `team_id = None` every comment on the document matches.
    async fn find_comments_by_document(
        &mut self,
        document_id: i64,
        team_id: Option<i64>,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, TeamError>;
    /// Oldest first.
    async fn find_replies(
        &mut self,
        parent_comment_id: i64,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, TeamError>;
    async fn update_comment_content(&mut self, id: i64, content: &str)
        -> Result<Comment, TeamError>;
    async fn set_comment_status(
        &mut self,
        id: i64,
        status: CommentStatus,
    ) -> Result<Comment, TeamError>;
}
