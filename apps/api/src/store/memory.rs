use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::bilingual::BilingualRecord;
use crate::errors::PersistenceError;
use crate::models::ResumeDocument;
use crate::store::ResumeStore;

/// Process-local store. Used when no `DATABASE_URL` is configured.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Uuid, ResumeDocument>>,
    records: RwLock<HashMap<Uuid, BilingualRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn save_document(
        &self,
        session_id: Uuid,
        document: &ResumeDocument,
    ) -> Result<(), PersistenceError> {
        self.documents
            .write()
            .await
            .insert(session_id, document.clone());
        Ok(())
    }

    async fn load_document(&self, session_id: Uuid) -> Result<Option<ResumeDocument>, PersistenceError> {
        Ok(self.documents.read().await.get(&session_id).cloned())
    }

    async fn save_bilingual(&self, record: &BilingualRecord) -> Result<(), PersistenceError> {
        self.records
            .write()
            .await
            .insert(record.session_id, record.clone());
        Ok(())
    }

    async fn load_bilingual(&self, session_id: Uuid) -> Result<Option<BilingualRecord>, PersistenceError> {
        Ok(self.records.read().await.get(&session_id).cloned())
    }
}
