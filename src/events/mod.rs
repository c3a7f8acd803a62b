//! Best-effort notifications emitted after successful mutations.
//!
//! Services dispatch a [`TeamEvent`] once their transaction has committed.
//! Listeners cannot fail the mutation that produced the event; an empty
//! [`EventRegistry`] makes dispatch a no-op.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use doc_teams::events::EventRegistry;
//! use doc_teams::events::listeners::LoggingListener;
//!
//! let mut registry = EventRegistry::new();
//! registry.listen(LoggingListener::new());
//! let events = Arc::new(registry);
//!
//! // hand `events` to TeamRegistry, MembershipStore and CommentGateway
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use doc_teams::events::{Listener, TeamEvent};
//! use async_trait::async_trait;
//!
//! struct AuditSink;
//!
//! #[async_trait]
//! impl Listener for AuditSink {
//!     async fn handle(&self, event: &TeamEvent) {
//!         if let TeamEvent::MemberRemoved { team_id, user_id, .. } = event {
//!             // write an audit row
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::TeamEvent;
pub use listener::Listener;
pub use registry::EventRegistry;
