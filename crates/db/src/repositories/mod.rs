use async_trait::async_trait;
use thiserror::Error;

use leadflow_core::domain::lead::{ConversationEntry, Lead, LeadId, LeadPatch};

pub mod lead;
pub mod memory;

pub use lead::SqlLeadRepository;
pub use memory::InMemoryLeadRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Store operations over the lead collection. Updates are sparse merges
/// with last-write-wins semantics; the conversation append is atomic at the
/// store so concurrent log actions cannot lose entries.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Full list, newest-created first.
    async fn list(&self) -> Result<Vec<Lead>, RepositoryError>;

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;

    /// Single insert carrying the full initial record.
    async fn create(&self, lead: Lead) -> Result<(), RepositoryError>;

    /// Applies the supplied fields only. Returns the updated record, or
    /// `None` when no record matches the identifier.
    async fn update(&self, id: &LeadId, patch: &LeadPatch) -> Result<Option<Lead>, RepositoryError>;

    /// Returns true when a record was removed.
    async fn delete(&self, id: &LeadId) -> Result<bool, RepositoryError>;

    /// Appends one entry to the conversation log in a single store
    /// operation and returns the updated record, or `None` when the lead
    /// does not exist.
    async fn append_conversation(
        &self,
        id: &LeadId,
        entry: ConversationEntry,
    ) -> Result<Option<Lead>, RepositoryError>;
}
