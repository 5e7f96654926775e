use std::sync::Arc;

use crate::editor::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Open sessions plus the store and translator they use.
    pub registry: Arc<SessionRegistry>,
}
