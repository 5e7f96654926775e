//! Axum route handlers for the Session API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::bilingual::LanguageView;
use crate::document::{self, FieldPath};
use crate::editor::autosave::{save_detached, SaveOutcome};
use crate::editor::editor_state::EditorState;
use crate::editor::registry::{CloseReport, SessionContext};
use crate::editor::session::{EditOutcome, SessionView};
use crate::errors::AppError;
use crate::models::ResumeDocument;
use crate::state::AppState;
use crate::timeline::autocomplete_month;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub session_id: Option<Uuid>,
    pub document: Option<ResumeDocument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: SessionView,
    pub language: LanguageView,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct CloseQuery {
    #[serde(default)]
    pub discard: bool,
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct FieldEditRequest {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub outcome: EditOutcome,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// `false` when there was nothing to undo / redo.
    pub moved: bool,
    pub session: SessionResponse,
}

#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AutocompleteResponse {
    pub value: String,
}

pub(crate) async fn session_response(context: &SessionContext) -> SessionResponse {
    let session = context.session.lock().await.view();
    let language = context.bilingual.view().await;
    SessionResponse { session, language }
}

fn parse_path(raw: &str) -> Result<FieldPath, AppError> {
    Ok(raw.parse::<FieldPath>()?)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// `{}` opens a blank document; `{sessionId}` re-opens a persisted one.
pub async fn handle_open_session(
    State(state): State<AppState>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (_, context) = state.registry.open(request.session_id, request.document).await?;
    Ok(Json(session_response(&context).await))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let context = state.registry.get(id).await?;
    Ok(Json(session_response(&context).await))
}

/// DELETE /api/v1/sessions/:id?discard=bool
///
/// Stops autosave and either performs a final save or drops unsaved edits.
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CloseQuery>,
) -> Result<Json<CloseReport>, AppError> {
    let report = state.registry.close(id, query.discard).await?;
    Ok(Json(report))
}

/// GET /api/v1/sessions/:id/field?path=
pub async fn handle_get_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<Json<FieldResponse>, AppError> {
    let path = parse_path(&query.path)?;
    let context = state.registry.get(id).await?;
    let value = document::get(context.session.lock().await.current(), &path)?;
    Ok(Json(FieldResponse {
        path: path.to_string(),
        value,
    }))
}

/// PATCH /api/v1/sessions/:id/field
pub async fn handle_set_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FieldEditRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let path = parse_path(&request.path)?;
    let context = state.registry.get(id).await?;
    let outcome = context.session.lock().await.edit(&path, request.value)?;
    Ok(Json(EditResponse {
        outcome,
        session: session_response(&context).await,
    }))
}

/// POST /api/v1/sessions/:id/entries
///
/// Appends `value` to the list at `path`.
pub async fn handle_push_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FieldEditRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let path = parse_path(&request.path)?;
    let context = state.registry.get(id).await?;
    let outcome = context.session.lock().await.push_entry(&path, request.value)?;
    Ok(Json(EditResponse {
        outcome,
        session: session_response(&context).await,
    }))
}

/// DELETE /api/v1/sessions/:id/entries?path=
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PathQuery>,
) -> Result<Json<EditResponse>, AppError> {
    let path = parse_path(&query.path)?;
    let context = state.registry.get(id).await?;
    let outcome = context.session.lock().await.remove_entry(&path)?;
    Ok(Json(EditResponse {
        outcome,
        session: session_response(&context).await,
    }))
}

/// POST /api/v1/sessions/:id/undo
pub async fn handle_undo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let context = state.registry.get(id).await?;
    let moved = context.session.lock().await.undo();
    Ok(Json(HistoryResponse {
        moved,
        session: session_response(&context).await,
    }))
}

/// POST /api/v1/sessions/:id/redo
pub async fn handle_redo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let context = state.registry.get(id).await?;
    let moved = context.session.lock().await.redo();
    Ok(Json(HistoryResponse {
        moved,
        session: session_response(&context).await,
    }))
}

/// POST /api/v1/sessions/:id/save
///
/// Manual "save now". Shares the single persistence slot with the timer.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveOutcome>, AppError> {
    let context = state.registry.get(id).await?;
    let outcome = save_detached(context.session.clone(), state.registry.store().clone()).await?;
    Ok(Json(outcome))
}

/// PUT /api/v1/sessions/:id/focus
pub async fn handle_focus(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FocusRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let path = request.path.as_deref().map(parse_path).transpose()?;
    let context = state.registry.get(id).await?;
    context.session.lock().await.focus(path)?;
    Ok(Json(session_response(&context).await))
}

/// PUT /api/v1/sessions/:id/editor-state
pub async fn handle_set_editor_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(editor_state): Json<EditorState>,
) -> Result<Json<SessionResponse>, AppError> {
    let context = state.registry.get(id).await?;
    context.session.lock().await.set_editor_state(editor_state);
    Ok(Json(session_response(&context).await))
}

/// POST /api/v1/dates/autocomplete
///
/// Completes a bare two-digit month ("03") to "03/".
pub async fn handle_autocomplete_date(
    Json(request): Json<AutocompleteRequest>,
) -> Json<AutocompleteResponse> {
    Json(AutocompleteResponse {
        value: autocomplete_month(&request.value).into_owned(),
    })
}
