//! Editing sessions: history, autosave and the HTTP surface that drives them.

pub mod autosave;
pub mod editor_state;
pub mod handlers;
pub mod history;
pub mod registry;
pub mod session;

pub use registry::{EditorSettings, SessionRegistry};
