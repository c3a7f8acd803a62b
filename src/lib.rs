//! Team membership lifecycle, role-based authorization and team-gated
//! comments for a document-sharing backend.
//!
//! The crate is transport-agnostic: callers resolve the acting user once
//! (see [`users::IdentityResolver`]) and pass its id into every operation.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use doc_teams::events::EventRegistry;
//! use doc_teams::memory::MemoryStore;
//! use doc_teams::teams::{MembershipStore, TeamRegistry};
//!
//! let store = MemoryStore::new();
//! let events = Arc::new(EventRegistry::new());
//! let teams = TeamRegistry::new(store.clone(), events.clone());
//! let members = MembershipStore::new(store, events);
//!
//! let team = teams.create_team("Eng", Some("backend team"), 1).await?;
//! members.add_member(team.id, 2, "MEMBER", 1).await?;
//! ```

pub mod comments;
pub mod config;
mod error;
pub mod events;
pub mod store;
pub mod teams;
pub mod users;
pub mod validators;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use comments::{Comment, CommentGateway, CommentStatus, DocumentCatalog, NewComment};
pub use config::TeamsConfig;
pub use error::{ErrorKind, TeamError};
pub use store::{Store, StoreTransaction};
pub use teams::{
    Authorizer, MemberStatus, MembershipStore, Team, TeamMembership, TeamRegistry, TeamRole,
    TeamStatus,
};
pub use users::{IdentityResolver, StoreIdentityResolver, User};
pub use validators::ValidationError;
