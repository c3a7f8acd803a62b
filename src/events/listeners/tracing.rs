use async_trait::async_trait;

use crate::events::{Listener, TeamEvent};

/// Emits each event as a `tracing` event with `team_id` as a structured field.
///
/// Requires the `tracing` feature to be enabled.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &TeamEvent) {
        match event.team_id() {
            Some(team_id) => tracing::info!(
                target: "doc_teams::events",
                event_name = event.name(),
                team_id,
                at = %event.timestamp(),
                ?event,
                "team event"
            ),
            None => tracing::info!(
                target: "doc_teams::events",
                event_name = event.name(),
                at = %event.timestamp(),
                ?event,
                "event without team"
            ),
        }
    }
}
