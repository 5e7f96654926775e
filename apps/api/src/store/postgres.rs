use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::bilingual::BilingualRecord;
use crate::errors::PersistenceError;
use crate::models::records::{BilingualRecordRow, ResumeDocumentRow};
use crate::models::ResumeDocument;
use crate::store::ResumeStore;

/// Postgres-backed store. Documents and bilingual records are JSONB upserts
/// keyed by session id.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn save_document(
        &self,
        session_id: Uuid,
        document: &ResumeDocument,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO resume_documents (session_id, document, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (session_id)
            DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
            "#,
        )
        .bind(session_id)
        .bind(Json(document))
        .execute(&self.pool)
        .await?;

        debug!("Upserted document for session {session_id}");
        Ok(())
    }

    async fn load_document(&self, session_id: Uuid) -> Result<Option<ResumeDocument>, PersistenceError> {
        let row: Option<ResumeDocumentRow> =
            sqlx::query_as("SELECT * FROM resume_documents WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| {
            debug!("Loaded document for session {} (updated {})", r.session_id, r.updated_at);
            r.document.0
        }))
    }

    async fn save_bilingual(&self, record: &BilingualRecord) -> Result<(), PersistenceError> {
        let translated_at = record.translated.as_ref().map(|t| t.translated_at);

        sqlx::query(
            r#"
            INSERT INTO bilingual_records
                (session_id, record, active_language, translated_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (session_id)
            DO UPDATE SET record = EXCLUDED.record,
                          active_language = EXCLUDED.active_language,
                          translated_at = EXCLUDED.translated_at,
                          updated_at = NOW()
            "#,
        )
        .bind(record.session_id)
        .bind(Json(record))
        .bind(record.active_language.code())
        .bind(translated_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Upserted bilingual record for session {} (active: {})",
            record.session_id, record.active_language
        );
        Ok(())
    }

    async fn load_bilingual(&self, session_id: Uuid) -> Result<Option<BilingualRecord>, PersistenceError> {
        let row: Option<BilingualRecordRow> =
            sqlx::query_as("SELECT * FROM bilingual_records WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| {
            debug!(
                "Loaded bilingual record for session {} (active: {}, translated at {:?}, updated {})",
                r.session_id, r.active_language, r.translated_at, r.updated_at
            );
            r.record.0
        }))
    }
}
