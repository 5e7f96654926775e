//! # Edit History
//!
//! Bounded undo/redo over whole-document snapshots.
//!
//! - `commit` pushes the current document onto `past` and clears `future`
//! - `undo` moves the current document to `future` and restores the top of `past`
//! - `redo` is the mirror image
//! - `past` is capped; the oldest snapshot is evicted first
//!
//! Snapshots are cheap: documents share every subtree an edit did not touch.

use std::collections::VecDeque;

use crate::models::ResumeDocument;

pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct EditHistory {
    /// Older documents, most recent last.
    past: VecDeque<ResumeDocument>,

    /// Undone documents, most recent last.
    future: Vec<ResumeDocument>,

    current: ResumeDocument,

    /// Maximum number of undo levels (at least 1).
    max_depth: usize,
}

impl EditHistory {
    pub fn new(initial: ResumeDocument) -> Self {
        Self::with_max_depth(initial, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(initial: ResumeDocument, max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            current: initial,
            max_depth: max_depth.max(1),
        }
    }

    pub fn current(&self) -> &ResumeDocument {
        &self.current
    }

    /// Records `next` as the new current document.
    pub fn commit(&mut self, next: ResumeDocument) {
        let previous = std::mem::replace(&mut self.current, next);
        self.past.push_back(previous);
        if self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        // A new branch invalidates everything that was undone.
        self.future.clear();
    }

    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.past.pop_back() {
            Some(previous) => {
                let undone = std::mem::replace(&mut self.current, previous);
                self.future.push(undone);
                true
            }
            None => false,
        }
    }

    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.future.pop() {
            Some(next) => {
                let previous = std::mem::replace(&mut self.current, next);
                self.past.push_back(previous);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Most recent snapshot that `undo` would restore.
    #[cfg(test)]
    pub fn last_past(&self) -> Option<&ResumeDocument> {
        self.past.back()
    }
}
