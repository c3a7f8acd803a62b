//! Local user records and identity resolution.

mod repository;
mod resolver;
mod types;

pub use repository::{CreateUser, UserRepository};
pub use resolver::{IdentityResolver, StoreIdentityResolver};
pub use types::User;
