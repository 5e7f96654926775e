pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::bilingual::handlers as language;
use crate::editor::handlers as sessions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/sessions", post(sessions::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:id/field",
            get(sessions::handle_get_field).patch(sessions::handle_set_field),
        )
        .route(
            "/api/v1/sessions/:id/entries",
            post(sessions::handle_push_entry).delete(sessions::handle_remove_entry),
        )
        .route("/api/v1/sessions/:id/undo", post(sessions::handle_undo))
        .route("/api/v1/sessions/:id/redo", post(sessions::handle_redo))
        .route("/api/v1/sessions/:id/save", post(sessions::handle_save))
        .route("/api/v1/sessions/:id/focus", put(sessions::handle_focus))
        .route(
            "/api/v1/sessions/:id/editor-state",
            put(sessions::handle_set_editor_state),
        )
        // Language API
        .route(
            "/api/v1/sessions/:id/language",
            post(language::handle_request_language),
        )
        .route(
            "/api/v1/sessions/:id/language/stale",
            post(language::handle_mark_stale),
        )
        .route(
            "/api/v1/sessions/:id/document",
            get(language::handle_get_document),
        )
        // Date helpers
        .route(
            "/api/v1/dates/autocomplete",
            post(sessions::handle_autocomplete_date),
        )
        .with_state(state)
}
