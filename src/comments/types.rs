//! Document comment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentStatus {
    Active,
    Deleted,
    Hidden,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Deleted => "DELETED",
            Self::Hidden => "HIDDEN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "DELETED" => Some(Self::Deleted),
            "HIDDEN" => Some(Self::Hidden),
            _ => None,
        }
    }
}

/// A comment on a document, optionally scoped to a team.
///
/// Comments are soft-deleted through `status` and never physically removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub document_id: i64,
    pub author_user_id: i64,
    /// Team whose members may see the comment, if any.
    pub team_id: Option<i64>,
    pub content: String,
    /// Comment this one replies to; always on the same document.
    pub parent_comment_id: Option<i64>,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_active(&self) -> bool {
        self.status == CommentStatus::Active
    }
}

/// Input for [`CommentGateway::create_comment`](super::CommentGateway::create_comment).
#[derive(Debug, Clone)]
pub struct NewComment {
    pub document_id: i64,
    pub team_id: Option<i64>,
    pub content: String,
    pub parent_comment_id: Option<i64>,
}
