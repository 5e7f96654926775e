use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::timeline::CollectionKind;

// ────────────────────────────────────────────────────────────────────────────
// Domain error taxonomy
// ────────────────────────────────────────────────────────────────────────────

/// Malformed or non-existent path access. A defect in the calling editor
/// surface, never something the end user can fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema error at '{path}': {kind}")]
pub struct SchemaError {
    pub path: String,
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, kind: SchemaErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaErrorKind {
    #[error("malformed path: {0}")]
    MalformedPath(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("intermediate container does not exist")]
    MissingContainer,

    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("expected a list index")]
    ExpectedIndex,

    #[error("expected a field name")]
    ExpectedField,

    #[error("value is a scalar and has no children")]
    NotAContainer,

    #[error("target is not a list")]
    NotAList,

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// One date/range/bullet rule violation, scoped to a single entry and field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{collection}[{index}].{field}: {reason}")]
pub struct ValidationError {
    pub collection: CollectionKind,
    pub index: usize,
    pub field: String,
    pub reason: ValidationReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationReason {
    #[error("'{value}' is not a year, MM/YYYY or an ongoing marker")]
    Malformed { value: String },

    #[error("month {month} is outside 01-12")]
    InvalidMonth { month: u32 },

    #[error("year {year} is outside {min}-{max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("'{value}' is in the future")]
    FutureDate { value: String },

    #[error("an ongoing marker is only valid as an end date")]
    OngoingStart,

    #[error("start '{start}' is after end '{end}'")]
    InvertedRange { start: String, end: String },

    #[error("bullet is {len} characters, limit is {max}")]
    BulletTooLong { len: usize, max: usize },
}

/// Every violation found in a document. Any entry here blocks persistence of
/// the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("{} validation error(s), first: {}", .0.len(), first_message(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn first_message(errors: &[ValidationError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn touches(&self, collection: CollectionKind) -> bool {
        self.iter().any(|e| e.collection == collection)
    }
}

/// Remote save failed. Recoverable: the session stays dirty and retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(e: sqlx::Error) -> Self {
        PersistenceError::Database(e.to_string())
    }
}

/// Remote translation failed. Recoverable: the previous language stays active.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("translation service error: {0}")]
    Service(String),

    #[error("translation reply was not a structured document: {excerpt}")]
    Unstructured { excerpt: String },

    #[error("translation task ended before reporting a result")]
    Interrupted,
}

/// A second remote operation where the scheduling invariants allow only one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcurrencyError {
    #[error("save ticket {got} does not match the in-flight save {expected:?}")]
    SaveTicketMismatch { expected: Option<u64>, got: u64 },
}

/// Failure modes of one persistence attempt.
#[derive(Debug, Clone, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP-facing error
// ────────────────────────────────────────────────────────────────────────────

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SaveError> for AppError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::Validation(v) => AppError::Validation(v),
            SaveError::Persistence(p) => AppError::Persistence(p),
            SaveError::Concurrency(c) => AppError::Concurrency(c),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Schema(e) => {
                tracing::error!("Schema error from editor surface: {e}");
                (StatusCode::BAD_REQUEST, "SCHEMA_ERROR", e.to_string(), None)
            }
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                format!("{} field(s) need attention before saving", errors.len()),
                serde_json::to_value(&errors.0).ok(),
            ),
            AppError::Persistence(e) => {
                tracing::warn!("Persistence error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PERSISTENCE_ERROR",
                    "Saving failed; your changes are kept and will be retried".to_string(),
                    None,
                )
            }
            AppError::Translation(e) => {
                tracing::warn!("Translation error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "TRANSLATION_ERROR",
                    "Translation failed; please try again".to_string(),
                    None,
                )
            }
            AppError::Concurrency(e) => {
                tracing::error!("Concurrency error: {e}");
                (StatusCode::CONFLICT, "CONCURRENCY_ERROR", e.to_string(), None)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display_first_violation() {
        let errors = ValidationErrors(vec![ValidationError {
            collection: CollectionKind::Experience,
            index: 2,
            field: "startDate".to_string(),
            reason: ValidationReason::InvalidMonth { month: 13 },
        }]);
        let text = errors.to_string();
        assert!(text.contains("1 validation error"));
        assert!(text.contains("experience[2].startDate"));
    }

    #[test]
    fn test_validation_maps_to_422() {
        let response = AppError::Validation(ValidationErrors::default()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_persistence_maps_to_503() {
        let response =
            AppError::Persistence(PersistenceError::Unavailable("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_schema_error_message_includes_path() {
        let e = SchemaError::new("experience.9", SchemaErrorKind::IndexOutOfBounds { index: 9, len: 1 });
        assert_eq!(
            e.to_string(),
            "schema error at 'experience.9': index 9 out of bounds for list of length 1"
        );
    }
}
