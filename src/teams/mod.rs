//! Teams, memberships and role-based authorization.
//!
//! - [`TeamRegistry`] owns team rows and the member counter.
//! - [`MembershipStore`] owns membership rows.
//! - [`authorization`] answers permission questions for both, and for
//!   [`CommentGateway`](crate::comments::CommentGateway).

pub mod authorization;
mod membership;
mod registry;
mod repository;
mod types;

pub use authorization::Authorizer;
pub use membership::MembershipStore;
pub use registry::TeamRegistry;
pub use repository::{CreateMembership, CreateTeam, TeamMembershipRepository, TeamRepository};
pub use types::{MemberStatus, Team, TeamMembership, TeamRole, TeamStatus};
