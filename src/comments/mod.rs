//! Document comments gated by team membership.

mod catalog;
mod gateway;
mod repository;
mod types;

pub use catalog::DocumentCatalog;
pub use gateway::CommentGateway;
pub use repository::{CommentRepository, CreateComment};
pub use types::{Comment, CommentStatus, NewComment};
