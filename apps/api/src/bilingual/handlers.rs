//! Axum route handlers for the Language API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bilingual::{LanguageSwitch, LanguageView};
use crate::errors::AppError;
use crate::models::{Language, ResumeDocument};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub target: Language,
}

#[derive(Debug, Serialize)]
pub struct LanguageResponse {
    pub switch: LanguageSwitch,
    pub language: LanguageView,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub language: Language,
    pub document: ResumeDocument,
}

/// POST /api/v1/sessions/:id/language
///
/// Activates `target`, translating on a cache miss. Concurrent requests for
/// the same target share one translation.
pub async fn handle_request_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<LanguageRequest>,
) -> Result<Json<LanguageResponse>, AppError> {
    let context = state.registry.get(id).await?;
    let native = context.session.lock().await.current().clone();

    let switch = context.bilingual.request_language(request.target, &native).await?;

    Ok(Json(LanguageResponse {
        switch,
        language: context.bilingual.view().await,
    }))
}

/// POST /api/v1/sessions/:id/language/stale
pub async fn handle_mark_stale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LanguageView>, AppError> {
    let context = state.registry.get(id).await?;
    Ok(Json(context.bilingual.mark_stale().await))
}

/// GET /api/v1/sessions/:id/document
///
/// The document in the active language, for rendering.
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let context = state.registry.get(id).await?;
    let native = context.session.lock().await.current().clone();
    let document = context.bilingual.active_document(&native).await;

    Ok(Json(DocumentResponse {
        language: document.content_language(),
        document,
    }))
}
