//! Open sessions, each with its bilingual controller and autosave timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bilingual::{BilingualController, BilingualRecord, Translator};
use crate::editor::autosave::{
    save_detached, spawn_autosave, AutosaveHandle, SaveOutcome, SaveState, SharedSession,
};
use crate::editor::history::DEFAULT_MAX_DEPTH;
use crate::editor::session::EditSession;
use crate::errors::{AppError, SaveError};
use crate::models::ResumeDocument;
use crate::store::ResumeStore;
use crate::timeline::Clock;

#[derive(Debug, Clone)]
pub struct EditorSettings {
    pub autosave_interval: Duration,
    pub history_max_depth: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(5),
            history_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Everything a request handler needs for one session.
pub struct SessionContext {
    pub session: SharedSession,
    pub bilingual: BilingualController,
}

struct Entry {
    context: Arc<SessionContext>,
    autosave: AutosaveHandle,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseReport {
    pub session_id: Uuid,
    pub discarded: bool,
    pub saved: bool,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    store: Arc<dyn ResumeStore>,
    translator: Arc<dyn Translator>,
    clock: Arc<dyn Clock>,
    settings: EditorSettings,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn ResumeStore>,
        translator: Arc<dyn Translator>,
        clock: Arc<dyn Clock>,
        settings: EditorSettings,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            translator,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn ResumeStore> {
        &self.store
    }

    /// Opens a session.
    ///
    /// - with `document`: a new session (under `session_id` if given) whose
    ///   normalized document is persisted right away;
    /// - with only `session_id`: re-opens the persisted document and its
    ///   bilingual record, or returns the session if it is already open;
    /// - with neither: a new session on an empty document.
    pub async fn open(
        &self,
        session_id: Option<Uuid>,
        document: Option<ResumeDocument>,
    ) -> Result<(Uuid, Arc<SessionContext>), AppError> {
        if let Some(id) = session_id {
            if let Some(entry) = self.sessions.read().await.get(&id) {
                if document.is_some() {
                    return Err(AppError::BadRequest(format!("session {id} is already open")));
                }
                return Ok((id, entry.context.clone()));
            }
        }

        let (id, session, record) = match (session_id, document) {
            (Some(id), None) => {
                let document = self
                    .store
                    .load_document(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
                let session = self.new_session(id, document);
                let record = match self.store.load_bilingual(id).await? {
                    Some(record) => record,
                    None => BilingualRecord::new(id, session.current().clone()),
                };
                info!("Re-opened session {id}");
                (id, session, record)
            }
            (id, document) => {
                let id = id.unwrap_or_else(Uuid::new_v4);
                let session = self.new_session(id, document.unwrap_or_default());
                self.store.save_document(id, session.current()).await?;
                let record = BilingualRecord::new(id, session.current().clone());
                self.store.save_bilingual(&record).await?;
                info!("Opened new session {id}");
                (id, session, record)
            }
        };

        let context = Arc::new(SessionContext {
            session: Arc::new(Mutex::new(session)),
            bilingual: BilingualController::new(record, self.translator.clone(), self.store.clone()),
        });

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&id) {
            // Lost a race with a concurrent open of the same id.
            return Ok((id, existing.context.clone()));
        }
        sessions.insert(id, self.start(context.clone()));
        Ok((id, context))
    }

    fn new_session(&self, id: Uuid, document: ResumeDocument) -> EditSession {
        EditSession::open(id, document, self.settings.history_max_depth, self.clock.clone())
    }

    fn start(&self, context: Arc<SessionContext>) -> Entry {
        let autosave = spawn_autosave(
            context.session.clone(),
            self.store.clone(),
            self.settings.autosave_interval,
        );
        Entry { context, autosave }
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<SessionContext>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| entry.context.clone())
            .ok_or_else(|| AppError::NotFound(format!("session {id}")))
    }

    /// Stops the timer (letting a running save finish), then either saves
    /// the remaining edits or drops them. A session whose final save fails
    /// stays open.
    pub async fn close(&self, id: Uuid, discard: bool) -> Result<CloseReport, AppError> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
        entry.autosave.shutdown().await;
        let context = entry.context;

        let saved = if discard {
            info!("Closing session {id}, discarding unsaved edits");
            false
        } else {
            match self.final_save(&context).await {
                Ok(saved) => saved,
                Err(e) => {
                    warn!("Final save for session {id} failed, keeping it open: {e}");
                    self.sessions.write().await.insert(id, self.start(context));
                    return Err(e.into());
                }
            }
        };

        let baseline = context.session.lock().await.baseline().clone();
        context.bilingual.checkpoint(&baseline).await;
        info!("Closed session {id}");

        Ok(CloseReport {
            session_id: id,
            discarded: discard,
            saved,
        })
    }

    async fn final_save(&self, context: &SessionContext) -> Result<bool, SaveError> {
        loop {
            match save_detached(context.session.clone(), self.store.clone()).await? {
                SaveOutcome::Saved { .. } => return Ok(true),
                SaveOutcome::NothingToSave => return Ok(false),
                SaveOutcome::AlreadyInFlight => {
                    let mut state = context.session.lock().await.watch_save_state();
                    // The sender lives in the session, which `context` keeps alive.
                    if state.wait_for(|s| *s != SaveState::Saving).await.is_err() {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Closes every session with a final save. Used on shutdown.
    pub async fn close_all(&self) {
        let ids: Vec<Uuid> = self.sessions.read().await.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.close(id, false).await {
                warn!("Session {id} not saved on shutdown: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::FieldPath;
    use crate::errors::PersistenceError;
    use crate::models::Language;
    use crate::store::MemoryStore;
    use crate::test_support::{fixed_clock, sample_document, CountingTranslator, TestStore};

    fn registry(store: Arc<dyn ResumeStore>) -> SessionRegistry {
        SessionRegistry::new(
            store,
            Arc::new(CountingTranslator::new()),
            fixed_clock(),
            EditorSettings {
                autosave_interval: Duration::from_secs(3600),
                history_max_depth: 10,
            },
        )
    }

    fn p(raw: &str) -> FieldPath {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn test_open_persists_and_reopens() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store.clone());
        let (id, _) = registry.open(None, Some(sample_document())).await.unwrap();
        assert_eq!(store.load_document(id).await.unwrap(), Some(sample_document()));

        registry.close(id, false).await.unwrap();
        assert!(registry.get(id).await.is_err());

        let (reopened, context) = registry.open(Some(id), None).await.unwrap();
        assert_eq!(reopened, id);
        assert_eq!(context.session.lock().await.current(), &sample_document());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let registry = registry(Arc::new(MemoryStore::new()));
        let err = registry.open(Some(Uuid::new_v4()), None).await.err().unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_close_saves_pending_edits() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store.clone());
        let (id, context) = registry.open(None, Some(sample_document())).await.unwrap();
        context
            .session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("Architect"))
            .unwrap();

        let report = registry.close(id, false).await.unwrap();
        assert!(report.saved);
        let saved = store.load_document(id).await.unwrap().unwrap();
        assert_eq!(saved.personal_info.title, "Architect");
    }

    #[tokio::test]
    async fn test_close_with_discard_drops_edits() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store.clone());
        let (id, context) = registry.open(None, Some(sample_document())).await.unwrap();
        context
            .session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("Architect"))
            .unwrap();

        let report = registry.close(id, true).await.unwrap();
        assert!(report.discarded && !report.saved);
        let saved = store.load_document(id).await.unwrap().unwrap();
        assert_eq!(saved.personal_info.title, "Senior Engineer");
    }

    #[tokio::test]
    async fn test_failed_final_save_keeps_session_open() {
        let store = Arc::new(TestStore::new());
        let registry = registry(store.clone());
        let (id, context) = registry.open(None, Some(sample_document())).await.unwrap();
        context
            .session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("Architect"))
            .unwrap();

        store.fail_saves(true);
        let err = registry.close(id, false).await.err().unwrap();
        assert!(matches!(err, AppError::Persistence(PersistenceError::Unavailable(_))));
        assert!(registry.get(id).await.is_ok());

        store.fail_saves(false);
        assert!(registry.close(id, false).await.unwrap().saved);
    }

    #[tokio::test]
    async fn test_close_waits_for_save_in_flight_then_saves_later_edits() {
        let store = Arc::new(TestStore::new());
        let registry = Arc::new(registry(store.clone()));
        let (id, context) = registry.open(None, Some(sample_document())).await.unwrap();
        // Consume the signal left by the initial persist.
        store.wait_until_save_started().await;

        context
            .session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("Architect"))
            .unwrap();
        store.hold_saves();
        let manual = tokio::spawn(save_detached(context.session.clone(), store.clone()));
        store.wait_until_save_started().await;

        context
            .session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("CTO"))
            .unwrap();
        let closing = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.close(id, false).await })
        };
        tokio::task::yield_now().await;
        store.release_saves();

        let manual = manual.await.unwrap().unwrap();
        assert_eq!(manual, SaveOutcome::Saved { state: SaveState::Dirty });
        let report = closing.await.unwrap().unwrap();
        assert!(report.saved);

        let saved = store.load_document(id).await.unwrap().unwrap();
        assert_eq!(saved.personal_info.title, "CTO");
        assert_eq!(store.saved_count(), 3);
    }

    #[tokio::test]
    async fn test_reopen_restores_cached_translation() {
        let store = Arc::new(MemoryStore::new());
        let registry = registry(store.clone());
        let (id, context) = registry.open(None, Some(sample_document())).await.unwrap();
        let native = context.session.lock().await.current().clone();
        context
            .bilingual
            .request_language(Language::Hebrew, &native)
            .await
            .unwrap();
        registry.close(id, false).await.unwrap();

        let (_, context) = registry.open(Some(id), None).await.unwrap();
        let view = context.bilingual.view().await;
        assert_eq!(view.active_language, Language::Hebrew);
        assert_eq!(view.translated_language, Some(Language::Hebrew));
    }
}
