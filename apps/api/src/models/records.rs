use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::bilingual::BilingualRecord;
use crate::models::resume::ResumeDocument;

#[derive(Debug, Clone, FromRow)]
pub struct ResumeDocumentRow {
    pub session_id: Uuid,
    pub document: Json<ResumeDocument>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BilingualRecordRow {
    pub session_id: Uuid,
    pub record: Json<BilingualRecord>,
    pub active_language: String,
    pub translated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
