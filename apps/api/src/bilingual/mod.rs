//! Bilingual snapshots: a native document plus an on-demand machine
//! translation, and which of the two is active.

pub mod controller;
pub mod handlers;
mod prompts;
pub mod translator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Language, ResumeDocument};

pub use controller::{BilingualController, LanguageSwitch};
pub use translator::{LlmTranslator, TranslationPayload, Translator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotState {
    NativeOnly,
    Translating,
    Translated,
    TranslationFailed,
}

/// A cached translation of the native document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedSnapshot {
    pub language: Language,
    pub document: ResumeDocument,
    pub translated_at: DateTime<Utc>,
}

/// Persisted alongside the session so a re-opened session recovers its
/// cached translation without calling the translator again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BilingualRecord {
    pub session_id: Uuid,
    /// Native document as of the last language request.
    pub native: ResumeDocument,
    pub translated: Option<TranslatedSnapshot>,
    pub active_language: Language,
    pub state: SnapshotState,
    /// Set explicitly; native edits never clear the cache on their own.
    #[serde(default)]
    pub stale: bool,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl BilingualRecord {
    pub fn new(session_id: Uuid, native: ResumeDocument) -> Self {
        Self {
            session_id,
            active_language: native.content_language(),
            native,
            translated: None,
            state: SnapshotState::NativeOnly,
            stale: false,
            last_error: None,
        }
    }

    /// The cached translation into `language`, if usable.
    pub fn cached(&self, language: Language) -> Option<&TranslatedSnapshot> {
        self.translated
            .as_ref()
            .filter(|t| t.language == language && !self.stale)
    }
}

/// Language state reported with a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageView {
    pub native_language: Language,
    pub active_language: Language,
    pub state: SnapshotState,
    pub stale: bool,
    pub translated_language: Option<Language>,
    pub translated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl From<&BilingualRecord> for LanguageView {
    fn from(record: &BilingualRecord) -> Self {
        Self {
            native_language: record.native.content_language(),
            active_language: record.active_language,
            state: record.state,
            stale: record.stale,
            translated_language: record.translated.as_ref().map(|t| t.language),
            translated_at: record.translated.as_ref().map(|t| t.translated_at),
            last_error: record.last_error.clone(),
        }
    }
}
