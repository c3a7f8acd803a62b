use async_trait::async_trait;

use super::TeamEvent;

/// Trait for handling team events asynchronously.
///
/// Handlers are infallible: whatever a listener does with an event, the
/// mutation that produced it has already committed.
///
/// # Example
///
/// ```rust,ignore
/// use doc_teams::events::{Listener, TeamEvent};
/// use async_trait::async_trait;
///
/// struct OwnerAlert;
///
/// #[async_trait]
/// impl Listener for OwnerAlert {
///     async fn handle(&self, event: &TeamEvent) {
///         if let TeamEvent::TeamDeleted { team_id, .. } = event {
///             // notify the remaining members
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &TeamEvent);
}
