//! Autosave: dirty/clean/saving state machine plus the per-session timer.
//!
//! Flow: begin_save (under lock, snapshot current) → store.save_document
//! (lock released, edits continue) → complete_save (under lock, reconcile
//! against whatever is current now).
//!
//! A stale "save succeeded" only moves the baseline; it never touches the
//! current document.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::editor::session::{BeginSave, EditSession};
use crate::errors::{ConcurrencyError, PersistenceError, SaveError};
use crate::models::ResumeDocument;
use crate::store::ResumeStore;

pub type SharedSession = Arc<Mutex<EditSession>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Clean,
    Dirty,
    Saving,
    SaveFailed,
}

/// A claim on the single persistence slot, holding the snapshot being saved.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub id: u64,
    pub snapshot: ResumeDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Persisted. `state` is `Dirty` when edits arrived during the save.
    Saved { state: SaveState },
    NothingToSave,
    /// Another save holds the slot; it (or the next tick) covers these edits.
    AlreadyInFlight,
}

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AutosaveState {
    state: SaveState,
    in_flight: Option<u64>,
    next_ticket: u64,
    last_error: Option<PersistenceError>,
    last_saved_at: Option<DateTime<Utc>>,
    published: watch::Sender<SaveState>,
}

impl Default for AutosaveState {
    fn default() -> Self {
        Self::new()
    }
}

impl AutosaveState {
    pub fn new() -> Self {
        Self {
            state: SaveState::Clean,
            in_flight: None,
            next_ticket: 1,
            last_error: None,
            last_saved_at: None,
            published: watch::channel(SaveState::Clean).0,
        }
    }

    fn set(&mut self, next: SaveState) {
        self.state = next;
        self.published.send_replace(next);
    }

    /// Follows every state transition, e.g. to wait out a save in flight.
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.published.subscribe()
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn last_error(&self) -> Option<&PersistenceError> {
        self.last_error.as_ref()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Reacts to a change of the current document. `dirty` is
    /// `current != baseline` after the change.
    pub fn on_change(&mut self, dirty: bool) {
        let next = match (self.state, dirty) {
            // Reconciled when the in-flight save completes.
            (SaveState::Saving, _) => SaveState::Saving,
            (SaveState::SaveFailed, true) => SaveState::SaveFailed,
            (_, true) => SaveState::Dirty,
            (_, false) => SaveState::Clean,
        };
        if next != self.state {
            debug!("Autosave state {:?} -> {:?}", self.state, next);
            self.set(next);
        }
    }

    /// Claims the persistence slot if there is something to save.
    pub fn begin(&mut self) -> Option<u64> {
        match self.state {
            SaveState::Dirty | SaveState::SaveFailed => {
                let id = self.next_ticket;
                self.next_ticket += 1;
                self.in_flight = Some(id);
                debug!("Autosave state {:?} -> Saving (ticket {id})", self.state);
                self.set(SaveState::Saving);
                Some(id)
            }
            SaveState::Clean | SaveState::Saving => None,
        }
    }

    /// Releases the slot. Leaves everything untouched when `ticket` is not
    /// the save in flight.
    pub fn finish(
        &mut self,
        ticket: u64,
        result: &Result<(), PersistenceError>,
        still_dirty: bool,
    ) -> Result<SaveState, ConcurrencyError> {
        if self.in_flight != Some(ticket) {
            return Err(ConcurrencyError::SaveTicketMismatch {
                expected: self.in_flight,
                got: ticket,
            });
        }
        self.in_flight = None;

        self.set(match (result, still_dirty) {
            (Ok(()), true) => SaveState::Dirty,
            (Ok(()), false) => SaveState::Clean,
            (Err(_), true) => SaveState::SaveFailed,
            (Err(_), false) => SaveState::Clean,
        });
        match result {
            Ok(()) => {
                self.last_error = None;
                self.last_saved_at = Some(Utc::now());
            }
            Err(e) => self.last_error = Some(e.clone()),
        }
        debug!("Autosave ticket {ticket} finished -> {:?}", self.state);
        Ok(self.state)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Driver
// ────────────────────────────────────────────────────────────────────────────

/// Runs one save attempt against `store`.
///
/// The session lock is held only to begin and to complete; the remote call
/// runs unlocked on a snapshot. If the returned future is dropped mid-save
/// the slot stays claimed, so callers that can be cancelled (request
/// handlers) go through [`save_detached`].
pub async fn run_save(session: &SharedSession, store: &dyn ResumeStore) -> Result<SaveOutcome, SaveError> {
    let (session_id, ticket) = {
        let mut guard = session.lock().await;
        match guard.begin_save()? {
            BeginSave::Started(ticket) => (guard.id(), ticket),
            BeginSave::NothingToSave => return Ok(SaveOutcome::NothingToSave),
            BeginSave::AlreadyInFlight => return Ok(SaveOutcome::AlreadyInFlight),
        }
    };

    let result = store.save_document(session_id, &ticket.snapshot).await;

    let mut guard = session.lock().await;
    let state = guard.complete_save(ticket, result.clone())?;
    match result {
        Ok(()) => {
            info!("Saved session {session_id} ({state:?})");
            Ok(SaveOutcome::Saved { state })
        }
        Err(e) => {
            warn!("Save failed for session {session_id}, will retry: {e}");
            Err(e.into())
        }
    }
}

/// [`run_save`] on its own task, so it completes even if the caller is dropped.
pub async fn save_detached(
    session: SharedSession,
    store: Arc<dyn ResumeStore>,
) -> Result<SaveOutcome, SaveError> {
    let task = tokio::spawn(async move { run_save(&session, store.as_ref()).await });
    match task.await {
        Ok(result) => result,
        Err(e) => Err(PersistenceError::Unavailable(format!("save task failed: {e}")).into()),
    }
}

/// Owns the timer task of one session.
pub struct AutosaveHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Stops further ticks and waits for a save that is already running.
    pub async fn shutdown(self) {
        // Fails only if the timer task already exited.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Autosave task ended abnormally: {e}");
        }
    }
}

/// Starts the timer for `session`. The first tick fires one `period` from now.
pub fn spawn_autosave(
    session: SharedSession,
    store: Arc<dyn ResumeStore>,
    period: Duration,
) -> AutosaveHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // Shutdown is only observed between ticks; a save in progress
            // below always runs to completion.
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => break,
            }

            match run_save(&session, store.as_ref()).await {
                Ok(SaveOutcome::Saved { .. }) | Ok(SaveOutcome::NothingToSave) => {}
                Ok(SaveOutcome::AlreadyInFlight) => debug!("Autosave tick skipped: save in flight"),
                Err(SaveError::Validation(errors)) => {
                    debug!("Autosave blocked by {} validation error(s)", errors.len())
                }
                // Logged inside run_save; SaveFailed is retried on the next tick.
                Err(SaveError::Persistence(_)) => {}
                Err(SaveError::Concurrency(e)) => tracing::error!("Autosave concurrency error: {e}"),
            }
        }
        debug!("Autosave timer stopped");
    });

    AutosaveHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::document::FieldPath;
    use crate::store::MemoryStore;
    use crate::test_support::{fixed_clock, sample_document, single_entry_document, TestStore};

    fn p(raw: &str) -> FieldPath {
        raw.parse().unwrap()
    }

    fn shared(doc: ResumeDocument) -> SharedSession {
        Arc::new(Mutex::new(EditSession::open(Uuid::new_v4(), doc, 50, fixed_clock())))
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut s = AutosaveState::new();
        assert_eq!(s.state(), SaveState::Clean);
        assert_eq!(s.begin(), None);

        s.on_change(true);
        assert_eq!(s.state(), SaveState::Dirty);
        let ticket = s.begin().unwrap();
        assert_eq!(s.state(), SaveState::Saving);
        assert_eq!(s.begin(), None);

        s.on_change(true);
        assert_eq!(s.state(), SaveState::Saving);

        assert_eq!(s.finish(ticket, &Ok(()), false), Ok(SaveState::Clean));
        assert!(s.last_saved_at().is_some());
    }

    #[test]
    fn test_failure_keeps_document_dirty() {
        let mut s = AutosaveState::new();
        s.on_change(true);
        let ticket = s.begin().unwrap();
        let err = PersistenceError::Unavailable("offline".into());
        assert_eq!(s.finish(ticket, &Err(err.clone()), true), Ok(SaveState::SaveFailed));
        assert_eq!(s.last_error(), Some(&err));

        // More edits do not hide the failure; the next attempt retries.
        s.on_change(true);
        assert_eq!(s.state(), SaveState::SaveFailed);
        assert!(s.begin().is_some());
    }

    #[test]
    fn test_mismatched_ticket_is_concurrency_error() {
        let mut s = AutosaveState::new();
        s.on_change(true);
        let ticket = s.begin().unwrap();
        let err = s.finish(ticket + 1, &Ok(()), false).unwrap_err();
        assert_eq!(
            err,
            ConcurrencyError::SaveTicketMismatch {
                expected: Some(ticket),
                got: ticket + 1
            }
        );
        assert_eq!(s.state(), SaveState::Saving);
    }

    #[tokio::test]
    async fn test_dirty_clears_only_after_successful_save() {
        let store = TestStore::new();
        let session = shared(sample_document());
        session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("Principal Engineer"))
            .unwrap();

        store.fail_saves(true);
        let err = run_save(&session, &store).await.unwrap_err();
        assert!(matches!(err, SaveError::Persistence(_)));
        {
            let guard = session.lock().await;
            assert!(guard.is_dirty());
            assert_eq!(guard.save_state(), SaveState::SaveFailed);
        }

        store.fail_saves(false);
        let outcome = run_save(&session, &store).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { state: SaveState::Clean });
        let guard = session.lock().await;
        assert!(!guard.is_dirty());
        assert_eq!(guard.baseline(), guard.current());
        assert_eq!(store.saved_count(), 1);
    }

    #[tokio::test]
    async fn test_edit_during_save_requeues() {
        let store = Arc::new(TestStore::new());
        store.hold_saves();
        let session = shared(sample_document());
        session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("First"))
            .unwrap();

        let task = {
            let session = session.clone();
            let store = store.clone();
            tokio::spawn(async move { run_save(&session, store.as_ref()).await })
        };
        store.wait_until_save_started().await;

        // The editor keeps working while the save is in flight.
        let saved_snapshot = {
            let mut guard = session.lock().await;
            assert_eq!(guard.save_state(), SaveState::Saving);
            let snapshot = guard.current().clone();
            guard.edit(&p("personalInfo.title"), json!("Second")).unwrap();
            snapshot
        };

        store.release_saves();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { state: SaveState::Dirty });

        let guard = session.lock().await;
        assert_eq!(guard.current().personal_info.title, "Second");
        assert_eq!(guard.baseline(), &saved_snapshot);
        assert!(guard.is_dirty());
    }

    #[tokio::test]
    async fn test_manual_save_while_in_flight_is_coalesced() {
        let store = Arc::new(TestStore::new());
        store.hold_saves();
        let session = shared(sample_document());
        session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("Edited"))
            .unwrap();

        let task = {
            let session = session.clone();
            let store = store.clone();
            tokio::spawn(async move { run_save(&session, store.as_ref()).await })
        };
        store.wait_until_save_started().await;

        let second = run_save(&session, store.as_ref()).await.unwrap();
        assert_eq!(second, SaveOutcome::AlreadyInFlight);

        store.release_saves();
        task.await.unwrap().unwrap();
        assert_eq!(store.saved_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_dates_block_persistence() {
        let store = MemoryStore::new();
        let session = shared(sample_document());
        session
            .lock()
            .await
            .edit(&p("experience.1.startDate"), json!("13/2020"))
            .unwrap();

        let err = run_save(&session, &store).await.unwrap_err();
        let SaveError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.0[0].index, 1);
        assert_eq!(errors.0[0].field, "startDate");
        assert_eq!(session.lock().await.save_state(), SaveState::Dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_saves_edit_scenario() {
        let store = Arc::new(TestStore::new());
        let initial = single_entry_document();
        let session = shared(initial.clone());
        let opened = session.lock().await.current().clone();

        session
            .lock()
            .await
            .edit(&p("experience.0.startDate"), json!("01/2019"))
            .unwrap();

        let handle = spawn_autosave(session.clone(), store.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;

        {
            let guard = session.lock().await;
            assert!(!guard.is_dirty());
            assert_eq!(guard.save_state(), SaveState::Clean);
            assert_eq!(guard.baseline().experience[0].start_date, "01/2019");
            assert_eq!(guard.history().last_past(), Some(&opened));
        }
        assert_eq!(store.saved_count(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_retried_on_next_tick() {
        let store = Arc::new(TestStore::new());
        store.fail_saves(true);
        let session = shared(sample_document());
        session
            .lock()
            .await
            .edit(&p("personalInfo.summary"), json!("Rewritten"))
            .unwrap();

        let handle = spawn_autosave(session.clone(), store.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(session.lock().await.save_state(), SaveState::SaveFailed);

        store.fail_saves(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.lock().await.save_state(), SaveState::Clean);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks_but_finishes_in_flight_save() {
        let store = Arc::new(TestStore::new());
        store.hold_saves();
        let session = shared(sample_document());
        session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("Before close"))
            .unwrap();

        let handle = spawn_autosave(session.clone(), store.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;
        store.wait_until_save_started().await;

        let shutdown = tokio::spawn(handle.shutdown());
        store.release_saves();
        shutdown.await.unwrap();
        assert_eq!(store.saved_count(), 1);
        assert_eq!(session.lock().await.save_state(), SaveState::Clean);

        // No further ticks after shutdown.
        session
            .lock()
            .await
            .edit(&p("personalInfo.title"), json!("After close"))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.saved_count(), 1);
    }
}
