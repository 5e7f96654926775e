//! # Bilingual Snapshot Controller
//!
//! Decides which document a session shows: the native one, a cached
//! translation, or a fresh translation from the collaborator.
//!
//! At most one translation per target language is in flight. Requests that
//! arrive while it runs wait on the same completion instead of calling the
//! translator again. The translation runs on its own task, so a caller that
//! goes away does not cancel it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::bilingual::{BilingualRecord, LanguageView, SnapshotState, TranslatedSnapshot, Translator};
use crate::errors::TranslationError;
use crate::models::{Language, ResumeDocument};
use crate::store::ResumeStore;

/// `None` until the translation finishes.
type Completion = Option<Result<(), TranslationError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageSwitch {
    /// Already active.
    Unchanged,
    /// Switched back to the native document.
    Native,
    /// Activated the cached translation.
    CacheHit,
    /// Activated a fresh translation.
    Translated,
}

struct Inner {
    record: BilingualRecord,
    in_flight: HashMap<Language, watch::Receiver<Completion>>,
}

enum Step {
    Done(LanguageSwitch, Option<BilingualRecord>),
    Wait(watch::Receiver<Completion>),
}

#[derive(Clone)]
pub struct BilingualController {
    inner: Arc<Mutex<Inner>>,
    translator: Arc<dyn Translator>,
    store: Arc<dyn ResumeStore>,
}

impl BilingualController {
    /// Wraps a new or restored record.
    pub fn new(record: BilingualRecord, translator: Arc<dyn Translator>, store: Arc<dyn ResumeStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                record,
                in_flight: HashMap::new(),
            })),
            translator,
            store,
        }
    }

    pub async fn view(&self) -> LanguageView {
        LanguageView::from(&self.inner.lock().await.record)
    }

    /// Makes `target` the active language for the given native document.
    pub async fn request_language(
        &self,
        target: Language,
        native: &ResumeDocument,
    ) -> Result<LanguageSwitch, TranslationError> {
        let step = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;

            // A finished task whose sender is gone no longer counts as in flight.
            if inner
                .in_flight
                .get(&target)
                .is_some_and(|rx| rx.has_changed().is_err())
            {
                inner.in_flight.remove(&target);
            }

            if target == inner.record.active_language {
                Step::Done(LanguageSwitch::Unchanged, None)
            } else if let Some(rx) = inner.in_flight.get(&target) {
                debug!(
                    "Session {}: joining in-flight {target} translation",
                    inner.record.session_id
                );
                Step::Wait(rx.clone())
            } else {
                inner.record.native = native.clone();
                if target == native.content_language() {
                    inner.record.active_language = target;
                    Step::Done(LanguageSwitch::Native, Some(inner.record.clone()))
                } else if inner.record.cached(target).is_some() {
                    debug!("Session {}: using cached {target} translation", inner.record.session_id);
                    inner.record.active_language = target;
                    Step::Done(LanguageSwitch::CacheHit, Some(inner.record.clone()))
                } else {
                    Step::Wait(self.start_translation(inner, target, native.clone()))
                }
            }
        };

        match step {
            Step::Done(switch, Some(record)) => {
                self.persist(&record).await;
                Ok(switch)
            }
            Step::Done(switch, None) => Ok(switch),
            Step::Wait(mut rx) => {
                let completion = match rx.wait_for(Option::is_some).await {
                    Ok(done) => done.clone(),
                    Err(_) => return Err(TranslationError::Interrupted),
                };
                match completion {
                    Some(Ok(())) => Ok(LanguageSwitch::Translated),
                    Some(Err(e)) => Err(e),
                    None => Err(TranslationError::Interrupted),
                }
            }
        }
    }

    fn start_translation(
        &self,
        inner: &mut Inner,
        target: Language,
        native: ResumeDocument,
    ) -> watch::Receiver<Completion> {
        let (tx, rx) = watch::channel(None);
        inner.in_flight.insert(target, rx.clone());
        debug!(
            "Session {}: {:?} -> Translating ({target})",
            inner.record.session_id, inner.record.state
        );
        inner.record.state = SnapshotState::Translating;

        let session_id = inner.record.session_id;
        let controller = self.clone();
        tokio::spawn(async move {
            let result = controller
                .translator
                .translate(session_id, target, &native)
                .await
                .and_then(|payload| payload.into_document(target));
            let outcome = controller.finish_translation(target, result).await;
            if tx.send(Some(outcome)).is_err() {
                debug!("Session {session_id}: {target} translation finished with no caller waiting");
            }
        });

        rx
    }

    async fn finish_translation(
        &self,
        target: Language,
        result: Result<ResumeDocument, TranslationError>,
    ) -> Result<(), TranslationError> {
        let (record, outcome) = {
            let mut inner = self.inner.lock().await;
            inner.in_flight.remove(&target);
            let session_id = inner.record.session_id;

            let outcome = match result {
                Ok(document) => {
                    inner.record.translated = Some(TranslatedSnapshot {
                        language: target,
                        document,
                        translated_at: Utc::now(),
                    });
                    inner.record.state = SnapshotState::Translated;
                    inner.record.active_language = target;
                    inner.record.stale = false;
                    inner.record.last_error = None;
                    info!("Session {session_id}: translated into {target}");
                    Ok(())
                }
                Err(e) => {
                    inner.record.state = SnapshotState::TranslationFailed;
                    inner.record.last_error = Some(e.to_string());
                    warn!(
                        "Session {session_id}: {target} translation failed, staying on {}: {e}",
                        inner.record.active_language
                    );
                    Err(e)
                }
            };
            (inner.record.clone(), outcome)
        };

        if outcome.is_ok() {
            self.persist(&record).await;
        }
        outcome
    }

    /// Marks the cached translation as out of date. The next request for its
    /// language translates again.
    pub async fn mark_stale(&self) -> LanguageView {
        let record = {
            let mut inner = self.inner.lock().await;
            inner.record.stale = true;
            inner.record.clone()
        };
        self.persist(&record).await;
        LanguageView::from(&record)
    }

    /// Records the latest native document and persists the record.
    pub async fn checkpoint(&self, native: &ResumeDocument) {
        let record = {
            let mut inner = self.inner.lock().await;
            inner.record.native = native.clone();
            inner.record.clone()
        };
        self.persist(&record).await;
    }

    /// The document in the active language. Falls back to `native` when the
    /// active language has no cached translation.
    pub async fn active_document(&self, native: &ResumeDocument) -> ResumeDocument {
        let inner = self.inner.lock().await;
        let active = inner.record.active_language;
        if active == native.content_language() {
            return native.clone();
        }
        match &inner.record.translated {
            Some(translated) if translated.language == active => translated.document.clone(),
            _ => native.clone(),
        }
    }

    async fn persist(&self, record: &BilingualRecord) {
        if let Err(e) = self.store.save_bilingual(record).await {
            warn!(
                "Failed to persist bilingual record for session {}: {e}",
                record.session_id
            );
        }
    }
}
