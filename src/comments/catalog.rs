use async_trait::async_trait;

use crate::TeamError;

/// Lookup into the document subsystem, which owns documents and their blobs.
///
/// Comments only need to know that the document they reference exists.
#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    async fn document_exists(&self, document_id: i64) -> Result<bool, TeamError>;
}
