use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::bilingual::prompts::{build_translation_prompt, translation_system};
use crate::errors::TranslationError;
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::models::{Language, ResumeDocument};

const EXCERPT_CHARS: usize = 160;

/// What came back from the translation collaborator. Callers must decide
/// what to do with a reply that is not a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationPayload {
    Structured(ResumeDocument),
    Raw(String),
}

impl TranslationPayload {
    /// Parses a model reply. Anything other than a JSON object shaped like a
    /// résumé (carrying at least `personalInfo`) is kept as raw text.
    pub fn classify(reply: &str) -> Self {
        let text = strip_json_fences(reply);
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => return TranslationPayload::Raw(text.to_string()),
        };
        if value.get("personalInfo").is_none() {
            return TranslationPayload::Raw(text.to_string());
        }
        match serde_json::from_value(value) {
            Ok(document) => TranslationPayload::Structured(document),
            Err(e) => {
                debug!("Translation reply did not match the schema: {e}");
                TranslationPayload::Raw(text.to_string())
            }
        }
    }

    /// The translated document relabelled as `target`, or an error for raw text.
    pub fn into_document(self, target: Language) -> Result<ResumeDocument, TranslationError> {
        match self {
            TranslationPayload::Structured(mut document) => {
                if document.content_language() != target {
                    std::sync::Arc::make_mut(&mut document.metadata).content_language = target;
                }
                Ok(document)
            }
            TranslationPayload::Raw(text) => Err(TranslationError::Unstructured {
                excerpt: text.chars().take(EXCERPT_CHARS).collect(),
            }),
        }
    }
}

/// Translation collaborator. Carried as `Arc<dyn Translator>`.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        session_id: Uuid,
        target: Language,
        native: &ResumeDocument,
    ) -> Result<TranslationPayload, TranslationError>;
}

/// Translates through the Anthropic Messages API.
pub struct LlmTranslator {
    llm: LlmClient,
}

impl LlmTranslator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

impl From<LlmError> for TranslationError {
    fn from(e: LlmError) -> Self {
        TranslationError::Service(e.to_string())
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(
        &self,
        session_id: Uuid,
        target: Language,
        native: &ResumeDocument,
    ) -> Result<TranslationPayload, TranslationError> {
        let document_json = serde_json::to_string_pretty(native)
            .map_err(|e| TranslationError::Service(format!("could not encode document: {e}")))?;
        let prompt = build_translation_prompt(native.content_language(), target, &document_json);

        debug!(
            "Requesting {} translation for session {session_id} via {}",
            target,
            self.llm.model()
        );
        let response = self.llm.call(&prompt, &translation_system()).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;

        let payload = TranslationPayload::classify(text);
        if let TranslationPayload::Raw(_) = &payload {
            warn!("Translation for session {session_id} returned unstructured text");
        }
        Ok(payload)
    }
}
