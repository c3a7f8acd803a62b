//! Unit-of-work contract over the backing store.
//!
//! Every state-changing operation opens one [`StoreTransaction`], performs
//! its reads, checks and writes through it, and commits. A transaction that
//! is dropped without [`commit`](StoreTransaction::commit) is rolled back,
//! so an abandoned or failed operation leaves no partial writes.

use async_trait::async_trait;

use crate::TeamError;
use crate::comments::CommentRepository;
use crate::teams::{TeamMembershipRepository, TeamRepository};
use crate::users::UserRepository;

/// A backing store able to open transactions.
#[async_trait]
pub trait Store: Send + Sync {
    type Transaction: StoreTransaction;

    async fn begin(&self) -> Result<Self::Transaction, TeamError>;
}

/// An open transaction exposing every repository.
#[async_trait]
pub trait StoreTransaction:
    TeamRepository + TeamMembershipRepository + CommentRepository + UserRepository + Send
{
    async fn commit(self) -> Result<(), TeamError>;
}
