use chrono::{DateTime, Utc};

use crate::teams::TeamRole;

/// Events emitted by team, membership and comment operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamEvent {
    // team lifecycle
    TeamCreated {
        team_id: i64,
        owner_id: i64,
        name: String,
        at: DateTime<Utc>,
    },
    TeamUpdated {
        team_id: i64,
        actor_id: i64,
        at: DateTime<Utc>,
    },
    TeamDeleted {
        team_id: i64,
        actor_id: i64,
        at: DateTime<Utc>,
    },

    // membership
    MemberAdded {
        team_id: i64,
        user_id: i64,
        membership_id: i64,
        role: TeamRole,
        reactivated: bool,
        actor_id: i64,
        at: DateTime<Utc>,
    },
    MemberRemoved {
        team_id: i64,
        user_id: i64,
        membership_id: i64,
        actor_id: i64,
        at: DateTime<Utc>,
    },
    MemberLeft {
        team_id: i64,
        user_id: i64,
        membership_id: i64,
        at: DateTime<Utc>,
    },
    MemberRoleChanged {
        team_id: i64,
        membership_id: i64,
        old_role: TeamRole,
        new_role: TeamRole,
        actor_id: i64,
        at: DateTime<Utc>,
    },

    // comments
    CommentCreated {
        comment_id: i64,
        document_id: i64,
        team_id: Option<i64>,
        author_id: i64,
        at: DateTime<Utc>,
    },
    CommentUpdated {
        comment_id: i64,
        actor_id: i64,
        at: DateTime<Utc>,
    },
    CommentDeleted {
        comment_id: i64,
        actor_id: i64,
        at: DateTime<Utc>,
    },

    // identity
    UserProvisioned {
        user_id: i64,
        external_id: String,
        at: DateTime<Utc>,
    },
}

impl TeamEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TeamCreated { .. } => "team.created",
            Self::TeamUpdated { .. } => "team.updated",
            Self::TeamDeleted { .. } => "team.deleted",
            Self::MemberAdded { .. } => "team.member.added",
            Self::MemberRemoved { .. } => "team.member.removed",
            Self::MemberLeft { .. } => "team.member.left",
            Self::MemberRoleChanged { .. } => "team.member.role_changed",
            Self::CommentCreated { .. } => "comment.created",
            Self::CommentUpdated { .. } => "comment.updated",
            Self::CommentDeleted { .. } => "comment.deleted",
            Self::UserProvisioned { .. } => "user.provisioned",
        }
    }

    /// The team the event concerns. `None` for identity events and for
    /// comments outside a team.
    pub fn team_id(&self) -> Option<i64> {
        match self {
            Self::TeamCreated { team_id, .. }
            | Self::TeamUpdated { team_id, .. }
            | Self::TeamDeleted { team_id, .. }
            | Self::MemberAdded { team_id, .. }
            | Self::MemberRemoved { team_id, .. }
            | Self::MemberLeft { team_id, .. }
            | Self::MemberRoleChanged { team_id, .. } => Some(*team_id),
            Self::CommentCreated { team_id, .. } => *team_id,
            Self::CommentUpdated { .. }
            | Self::CommentDeleted { .. }
            | Self::UserProvisioned { .. } => None,
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::TeamCreated { at, .. }
            | Self::TeamUpdated { at, .. }
            | Self::TeamDeleted { at, .. }
            | Self::MemberAdded { at, .. }
            | Self::MemberRemoved { at, .. }
            | Self::MemberLeft { at, .. }
            | Self::MemberRoleChanged { at, .. }
            | Self::CommentCreated { at, .. }
            | Self::CommentUpdated { at, .. }
            | Self::CommentDeleted { at, .. }
            | Self::UserProvisioned { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let now = Utc::now();

        assert_eq!(
            TeamEvent::TeamCreated {
                team_id: 1,
                owner_id: 1,
                name: "Eng".to_owned(),
                at: now
            }
            .name(),
            "team.created"
        );

        assert_eq!(
            TeamEvent::MemberAdded {
                team_id: 1,
                user_id: 2,
                membership_id: 2,
                role: TeamRole::Member,
                reactivated: false,
                actor_id: 1,
                at: now
            }
            .name(),
            "team.member.added"
        );

        assert_eq!(
            TeamEvent::CommentDeleted {
                comment_id: 3,
                actor_id: 1,
                at: now
            }
            .name(),
            "comment.deleted"
        );
    }

    #[test]
    fn test_event_timestamp() {
        let now = Utc::now();
        let event = TeamEvent::MemberLeft {
            team_id: 1,
            user_id: 2,
            membership_id: 2,
            at: now,
        };

        assert_eq!(event.timestamp(), now);
    }

    #[test]
    fn test_event_team_id() {
        let now = Utc::now();

        let left = TeamEvent::MemberLeft {
            team_id: 4,
            user_id: 2,
            membership_id: 9,
            at: now,
        };
        assert_eq!(left.team_id(), Some(4));

        let unscoped = TeamEvent::CommentCreated {
            comment_id: 1,
            document_id: 10,
            team_id: None,
            author_id: 2,
            at: now,
        };
        assert_eq!(unscoped.team_id(), None);

        let provisioned = TeamEvent::UserProvisioned {
            user_id: 3,
            external_id: "idp|3".to_owned(),
            at: now,
        };
        assert_eq!(provisioned.team_id(), None);
    }
}
