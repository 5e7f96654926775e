//! Persistence collaborator.
//!
//! The store is the system of record. It performs no merging or validation:
//! callers hand it complete, already-validated documents.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::bilingual::BilingualRecord;
use crate::errors::PersistenceError;
use crate::models::ResumeDocument;

pub use memory::MemoryStore;
pub use postgres::PgResumeStore;

/// Carried in `AppState` as `Arc<dyn ResumeStore>`.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn save_document(
        &self,
        session_id: Uuid,
        document: &ResumeDocument,
    ) -> Result<(), PersistenceError>;

    async fn load_document(&self, session_id: Uuid) -> Result<Option<ResumeDocument>, PersistenceError>;

    async fn save_bilingual(&self, record: &BilingualRecord) -> Result<(), PersistenceError>;

    async fn load_bilingual(&self, session_id: Uuid) -> Result<Option<BilingualRecord>, PersistenceError>;
}
