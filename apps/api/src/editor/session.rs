//! # Edit Session
//!
//! One open résumé: history, persisted baseline, autosave state, the current
//! validation report and the ambient editor state.
//!
//! Local edits are synchronous. Every edit commits to history even when it
//! leaves a collection invalid; an invalid collection is not re-sorted and
//! blocks persistence until fixed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::document::{self, FieldPath};
use crate::editor::autosave::{AutosaveState, SaveState, SaveTicket};
use crate::editor::editor_state::{EditorState, Section};
use crate::editor::history::EditHistory;
use crate::errors::{ConcurrencyError, PersistenceError, SchemaError, ValidationErrors};
use crate::models::ResumeDocument;
use crate::timeline::{normalize_document, sort_in_document, validate_document, Clock, CollectionKind};

/// Result of trying to claim the persistence slot.
#[derive(Debug)]
pub enum BeginSave {
    Started(SaveTicket),
    NothingToSave,
    AlreadyInFlight,
}

/// What a local edit did to the session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    /// `false` when the edit produced an identical document.
    pub changed: bool,
    /// A dated collection was re-ordered as part of the commit.
    pub resorted: bool,
    pub validation: ValidationErrors,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub document: ResumeDocument,
    pub dirty: bool,
    pub save_state: SaveState,
    pub last_save_error: Option<String>,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_depth: usize,
    pub validation: ValidationErrors,
    pub active_field: Option<FieldPath>,
    pub editor_state: EditorState,
}

pub struct EditSession {
    id: Uuid,
    history: EditHistory,
    /// Last document confirmed persisted (or loaded).
    baseline: ResumeDocument,
    autosave: AutosaveState,
    validation: ValidationErrors,
    active_field: Option<FieldPath>,
    editor_state: EditorState,
    clock: Arc<dyn Clock>,
}

impl EditSession {
    /// Opens a session on `document`. Dated collections are sorted first; the
    /// sorted document is both the current document and the baseline.
    pub fn open(id: Uuid, document: ResumeDocument, max_depth: usize, clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        let normalized = normalize_document(&document, today);
        let validation = validate_document(&normalized, today).err().unwrap_or_default();
        if !validation.is_empty() {
            debug!("Session {id} opened with {} validation error(s)", validation.len());
        }

        Self {
            id,
            history: EditHistory::with_max_depth(normalized.clone(), max_depth),
            baseline: normalized,
            autosave: AutosaveState::new(),
            validation,
            active_field: None,
            editor_state: EditorState::default(),
            clock,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current(&self) -> &ResumeDocument {
        self.history.current()
    }

    pub fn baseline(&self) -> &ResumeDocument {
        &self.baseline
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn validation(&self) -> &ValidationErrors {
        &self.validation
    }

    pub fn save_state(&self) -> SaveState {
        self.autosave.state()
    }

    pub fn watch_save_state(&self) -> watch::Receiver<SaveState> {
        self.autosave.subscribe()
    }

    pub fn is_dirty(&self) -> bool {
        self.history.current() != &self.baseline
    }

    // ── Local edits ─────────────────────────────────────────────────────────

    pub fn edit(&mut self, path: &FieldPath, value: Value) -> Result<EditOutcome, SchemaError> {
        let next = document::set(self.current(), path, value)?;
        Ok(self.apply(next, path))
    }

    pub fn push_entry(&mut self, path: &FieldPath, value: Value) -> Result<EditOutcome, SchemaError> {
        let next = document::push(self.current(), path, value)?;
        Ok(self.apply(next, path))
    }

    pub fn remove_entry(&mut self, path: &FieldPath) -> Result<EditOutcome, SchemaError> {
        let next = document::remove(self.current(), path)?;
        Ok(self.apply(next, path))
    }

    fn unchanged(&self) -> EditOutcome {
        EditOutcome {
            changed: false,
            resorted: false,
            validation: self.validation.clone(),
        }
    }

    fn apply(&mut self, next: ResumeDocument, path: &FieldPath) -> EditOutcome {
        if &next == self.current() {
            return self.unchanged();
        }

        let today = self.clock.today();
        let validation = validate_document(&next, today).err().unwrap_or_default();

        // Every valid collection is kept sorted, whichever path the edit touched.
        let sorted = CollectionKind::REPEATABLE
            .into_iter()
            .filter(|kind| !validation.touches(*kind))
            .fold(next.clone(), |doc, kind| sort_in_document(&doc, kind, today));
        let resorted = sorted != next;
        let next = sorted;
        // A manual reorder that sorting undoes is not an edit.
        if &next == self.current() {
            return self.unchanged();
        }
        if resorted {
            debug!("Session {}: re-sorted after edit at {path}", self.id);
        }

        self.history.commit(next);
        self.validation = validation;
        self.autosave.on_change(self.is_dirty());

        EditOutcome {
            changed: true,
            resorted,
            validation: self.validation.clone(),
        }
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.refresh();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.refresh();
        }
        moved
    }

    fn refresh(&mut self) {
        self.validation = validate_document(self.current(), self.clock.today())
            .err()
            .unwrap_or_default();
        self.autosave.on_change(self.is_dirty());
    }

    // ── Editor state ────────────────────────────────────────────────────────

    /// Moves the active-field pointer. The path must resolve in the current
    /// document; the active section follows it.
    pub fn focus(&mut self, path: Option<FieldPath>) -> Result<(), SchemaError> {
        if let Some(path) = &path {
            document::get(self.current(), path)?;
            if let Some(section) = Section::of(path) {
                self.editor_state.active_section = section;
            }
        }
        self.active_field = path;
        Ok(())
    }

    pub fn set_editor_state(&mut self, state: EditorState) {
        self.editor_state = state;
    }

    pub fn editor_state(&self) -> &EditorState {
        &self.editor_state
    }

    // ── Persistence protocol ────────────────────────────────────────────────

    /// Claims the persistence slot and snapshots the current document.
    pub fn begin_save(&mut self) -> Result<BeginSave, ValidationErrors> {
        match self.autosave.state() {
            SaveState::Saving => return Ok(BeginSave::AlreadyInFlight),
            SaveState::Clean => return Ok(BeginSave::NothingToSave),
            SaveState::Dirty | SaveState::SaveFailed => {}
        }
        if !self.validation.is_empty() {
            return Err(self.validation.clone());
        }

        Ok(match self.autosave.begin() {
            Some(id) => BeginSave::Started(SaveTicket {
                id,
                snapshot: self.current().clone(),
            }),
            None => BeginSave::NothingToSave,
        })
    }

    /// Reconciles a finished save against whatever is current now. Only the
    /// baseline and the state flags move; the current document never does.
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), PersistenceError>,
    ) -> Result<SaveState, ConcurrencyError> {
        let still_dirty = match &result {
            Ok(()) => self.current() != &ticket.snapshot,
            Err(_) => self.is_dirty(),
        };
        let state = self.autosave.finish(ticket.id, &result, still_dirty)?;
        if result.is_ok() {
            self.baseline = ticket.snapshot;
        }
        Ok(state)
    }

    pub fn view(&self) -> SessionView {
        let history = self.history();
        SessionView {
            session_id: self.id,
            document: self.current().clone(),
            dirty: self.is_dirty(),
            save_state: self.save_state(),
            last_save_error: self.autosave.last_error().map(|e| e.to_string()),
            last_saved_at: self.autosave.last_saved_at(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            undo_depth: history.undo_depth(),
            validation: self.validation().clone(),
            active_field: self.active_field.clone(),
            editor_state: self.editor_state().clone(),
        }
    }
}
