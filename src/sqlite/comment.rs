use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{corrupt_column, db_error, SqliteTransaction};
use crate::comments::{Comment, CommentRepository, CommentStatus, CreateComment};
use crate::TeamError;

#[derive(FromRow)]
struct CommentRecord {
    id: i64,
    document_id: i64,
    author_user_id: i64,
    team_id: Option<i64>,
    content: String,
    parent_comment_id: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CommentRecord> for Comment {
    type Error = TeamError;

    fn try_from(row: CommentRecord) -> Result<Self, Self::Error> {
        let status = CommentStatus::parse(&row.status)
            .ok_or_else(|| corrupt_column("document_comments.status", &row.status))?;
        Ok(Comment {
            id: row.id,
            document_id: row.document_id,
            author_user_id: row.author_user_id,
            team_id: row.team_id,
            content: row.content,
            parent_comment_id: row.parent_comment_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl CommentRepository for SqliteTransaction {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, data), err))]
    async fn create_comment(&mut self, data: CreateComment) -> Result<Comment, TeamError> {
        let now = Utc::now();

        let row: CommentRecord = sqlx::query_as(
            r"
            INSERT INTO document_comments
                (document_id, author_user_id, team_id, content, parent_comment_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, document_id, author_user_id, team_id, content, parent_comment_id, status, created_at, updated_at
            ",
        )
        .bind(data.document_id)
        .bind(data.author_user_id)
        .bind(data.team_id)
        .bind(&data.content)
        .bind(data.parent_comment_id)
        .bind(CommentStatus::Active.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("create_comment"))?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_comment(&mut self, id: i64) -> Result<Option<Comment>, TeamError> {
        let row: Option<CommentRecord> = sqlx::query_as(
            "SELECT id, document_id, author_user_id, team_id, content, parent_comment_id, status, created_at, updated_at FROM document_comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("find_comment"))?;

        row.map(Comment::try_from).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_comments_by_document(
        &mut self,
        document_id: i64,
        team_id: Option<i64>,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, TeamError> {
        let rows: Vec<CommentRecord> = sqlx::query_as(
            r"
            SELECT id, document_id, author_user_id, team_id, content, parent_comment_id, status, created_at, updated_at
            FROM document_comments
            WHERE document_id = ? AND status = ? AND (? IS NULL OR team_id = ?)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(document_id)
        .bind(status.as_str())
        .bind(team_id)
        .bind(team_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("find_comments_by_document"))?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_replies(
        &mut self,
        parent_comment_id: i64,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, TeamError> {
        let rows: Vec<CommentRecord> = sqlx::query_as(
            r"
            SELECT id, document_id, author_user_id, team_id, content, parent_comment_id, status, created_at, updated_at
            FROM document_comments
            WHERE parent_comment_id = ? AND status = ?
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(parent_comment_id)
        .bind(status.as_str())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("find_replies"))?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, content), err))]
    async fn update_comment_content(
        &mut self,
        id: i64,
        content: &str,
    ) -> Result<Comment, TeamError> {
        let row: Option<CommentRecord> = sqlx::query_as(
            r"
            UPDATE document_comments SET content = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, document_id, author_user_id, team_id, content, parent_comment_id, status, created_at, updated_at
            ",
        )
        .bind(content)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("update_comment_content"))?;

        row.ok_or_else(|| TeamError::not_found("comment", id))?
            .try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn set_comment_status(
        &mut self,
        id: i64,
        status: CommentStatus,
    ) -> Result<Comment, TeamError> {
        let row: Option<CommentRecord> = sqlx::query_as(
            r"
            UPDATE document_comments SET status = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, document_id, author_user_id, team_id, content, parent_comment_id, status, created_at, updated_at
            ",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("set_comment_status"))?;

        row.ok_or_else(|| TeamError::not_found("comment", id))?
            .try_into()
    }
}
