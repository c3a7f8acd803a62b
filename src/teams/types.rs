//! Core types for team management.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validators::ValidationError;

/// Lifecycle state of a team. Teams are never physically removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamStatus {
    Active,
    Archived,
    Deleted,
}

impl TeamStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
            Self::Deleted => "DELETED",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "ARCHIVED" => Some(Self::Archived),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Permission tier of a member within a team.
///
/// Exactly one `Owner` membership exists per team and its role never
/// changes. `Owner` and `Admin` hold manage permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
            Self::Viewer => "VIEWER",
        }
    }

    /// Parse a role name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OWNER" => Ok(Self::Owner),
            "ADMIN" => Ok(Self::Admin),
            "MEMBER" => Ok(Self::Member),
            "VIEWER" => Ok(Self::Viewer),
            _ => Err(ValidationError::UnknownRole(s.to_owned())),
        }
    }

    /// Whether this role may add and remove members.
    pub fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl FromStr for TeamRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity state of a membership row.
///
/// `Invited` is reserved: no operation produces or consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Active,
    Removed,
    Invited,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Removed => "REMOVED",
            Self::Invited => "INVITED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "REMOVED" => Some(Self::Removed),
            "INVITED" => Some(Self::Invited),
            _ => None,
        }
    }
}

/// A named group with exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier.
    pub id: i64,
    /// Team name, unique per owner.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// User ID of the team owner.
    pub owner_id: i64,
    /// Lifecycle state.
    pub status: TeamStatus,
    /// Number of active memberships, never below 1.
    pub member_count: i64,
    /// When the team was created.
    pub created_at: DateTime<Utc>,
    /// When the team was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn is_active(&self) -> bool {
        self.status == TeamStatus::Active
    }
}

/// Links a user to a team with a role.
///
/// At most one row exists per `(team_id, user_id)`; removal flips `status`
/// and re-adding reactivates the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    /// Unique identifier, stable across deactivate/reactivate cycles.
    pub id: i64,
    /// The team this membership belongs to.
    pub team_id: i64,
    /// The user who is a member.
    pub user_id: i64,
    pub role: TeamRole,
    pub status: MemberStatus,
    /// When the row was first created.
    pub joined_at: DateTime<Utc>,
    /// When the membership was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TeamMembership {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}
