use async_trait::async_trait;

use crate::events::{Listener, TeamEvent};

/// Writes one `log` record per event, keyed by team where the event has one.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Creates a new logging listener at INFO level.
    pub fn new() -> Self {
        Self::with_level(log::Level::Info)
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

/// `key=value` pairs for the record, in the crate's log format.
fn fields(event: &TeamEvent) -> String {
    let mut out = format!("event=\"{}\"", event.name());
    if let Some(team_id) = event.team_id() {
        out.push_str(&format!(", team_id={team_id}"));
    }
    match event {
        TeamEvent::TeamCreated { owner_id, name, .. } => {
            out.push_str(&format!(", owner_id={owner_id}, name=\"{name}\""));
        }
        TeamEvent::MemberAdded {
            user_id,
            role,
            reactivated,
            ..
        } => {
            out.push_str(&format!(
                ", user_id={user_id}, role={role}, reactivated={reactivated}"
            ));
        }
        TeamEvent::MemberRemoved { user_id, .. } | TeamEvent::MemberLeft { user_id, .. } => {
            out.push_str(&format!(", user_id={user_id}"));
        }
        TeamEvent::MemberRoleChanged {
            membership_id,
            old_role,
            new_role,
            ..
        } => {
            out.push_str(&format!(
                ", membership_id={membership_id}, old_role={old_role}, new_role={new_role}"
            ));
        }
        TeamEvent::CommentCreated {
            comment_id,
            document_id,
            ..
        } => {
            out.push_str(&format!(", comment_id={comment_id}, document_id={document_id}"));
        }
        TeamEvent::CommentUpdated { comment_id, .. } | TeamEvent::CommentDeleted { comment_id, .. } => {
            out.push_str(&format!(", comment_id={comment_id}"));
        }
        TeamEvent::UserProvisioned {
            user_id,
            external_id,
            ..
        } => {
            out.push_str(&format!(", user_id={user_id}, external_id=\"{external_id}\""));
        }
        TeamEvent::TeamUpdated { .. } | TeamEvent::TeamDeleted { .. } => {}
    }
    out
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &TeamEvent) {
        log::log!(
            target: "doc_teams::events",
            self.level,
            "msg=\"team event\", {}, at={}",
            fields(event),
            event.timestamp().to_rfc3339()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::TeamRole;
    use chrono::Utc;

    #[test]
    fn test_logging_listener_levels() {
        assert_eq!(LoggingListener::default().level, log::Level::Info);
        assert_eq!(
            LoggingListener::with_level(log::Level::Debug).level,
            log::Level::Debug
        );
    }

    #[test]
    fn test_fields_carry_team_and_role() {
        let event = TeamEvent::MemberRoleChanged {
            team_id: 3,
            membership_id: 8,
            old_role: TeamRole::Viewer,
            new_role: TeamRole::Admin,
            actor_id: 1,
            at: Utc::now(),
        };

        assert_eq!(
            fields(&event),
            "event=\"team.member.role_changed\", team_id=3, membership_id=8, old_role=VIEWER, new_role=ADMIN"
        );
    }

    #[test]
    fn test_fields_without_team() {
        let event = TeamEvent::CommentDeleted {
            comment_id: 12,
            actor_id: 1,
            at: Utc::now(),
        };

        assert_eq!(fields(&event), "event=\"comment.deleted\", comment_id=12");
    }

    #[tokio::test]
    async fn test_logging_listener_handle() {
        let listener = LoggingListener::new();
        let event = TeamEvent::MemberLeft {
            team_id: 1,
            user_id: 2,
            membership_id: 2,
            at: Utc::now(),
        };

        listener.handle(&event).await;
    }
}
