pub mod content;
pub mod description;
pub mod name;

pub use content::validate_comment_content;
pub use description::validate_description;
pub use name::validate_team_name;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    #[error("Team name cannot be empty")]
    NameEmpty,
    #[error("Team name must be at least {min} characters")]
    NameTooShort { min: usize },
    #[error("Team name is too long (max {max} characters)")]
    NameTooLong { max: usize },
    #[error("Team description is too long (max {max} characters)")]
    DescriptionTooLong { max: usize },
    #[error("A team with this name already exists")]
    DuplicateTeamName,
    #[error("Unknown team role: {0}")]
    UnknownRole(String),
    #[error("Comment content cannot be empty")]
    ContentEmpty,
    #[error("Comment content is too long (max {max} characters)")]
    ContentTooLong { max: usize },
    #[error("Parent comment does not exist")]
    ParentCommentNotFound,
    #[error("Parent comment belongs to a different document")]
    ParentOnDifferentDocument,
    #[error("External identity cannot be empty")]
    ExternalIdEmpty,
}
