use super::{Listener, TeamEvent};

/// Ordered set of listeners shared by the services.
///
/// Build it once at startup, wrap it in an `Arc`, and pass it to every
/// service that should emit events.
#[derive(Default)]
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener to receive events.
    ///
    /// Listeners are called in the order they are registered.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Dispatch an event to all registered listeners.
    pub async fn dispatch(&self, event: TeamEvent) {
        if self.listeners.is_empty() {
            return;
        }

        log::debug!(target: "doc_teams", "msg=\"dispatching event\", event={}", event.name());
        for listener in &self.listeners {
            listener.handle(&event).await;
        }
    }
}
