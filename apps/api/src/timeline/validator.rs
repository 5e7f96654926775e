use std::sync::Arc;

use chrono::NaiveDate;

use crate::errors::{ValidationError, ValidationErrors, ValidationReason};
use crate::models::{Language, ResumeDocument, MAX_BULLET_CHARS};
use crate::timeline::dates::{check_date, DateRole, DateValue};
use crate::timeline::{CollectionKind, Dated};

/// Validates every entry of one collection, collecting all violations so the
/// editor can mark each offending control. Field names are the path
/// segments relative to the entry (`startDate`, `description.2`).
pub fn validate_collection<T: Dated>(
    kind: CollectionKind,
    entries: &[Arc<T>],
    language: Language,
    today: NaiveDate,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        validate_entry(kind, index, entry.as_ref(), language, today, &mut errors);
    }
    errors
}

fn validate_entry<T: Dated>(
    kind: CollectionKind,
    index: usize,
    entry: &T,
    language: Language,
    today: NaiveDate,
    errors: &mut Vec<ValidationError>,
) {
    let mut push = |field: String, reason: ValidationReason| {
        errors.push(ValidationError {
            collection: kind,
            index,
            field,
            reason,
        })
    };

    let start = match check_date(entry.start_date(), DateRole::Start, language, today) {
        Ok(v) => v,
        Err(reason) => {
            push(DateRole::Start.field_name().to_string(), reason);
            None
        }
    };
    let end = match check_date(entry.end_date(), DateRole::End, language, today) {
        Ok(v) => v,
        Err(reason) => {
            push(DateRole::End.field_name().to_string(), reason);
            None
        }
    };

    // Range rule only applies to a closed range of two valid dates.
    if let (Some(start), Some(end)) = (start, end) {
        if end != DateValue::Ongoing {
            if let (Some(s), Some(e)) = (start.timestamp(today), end.timestamp(today)) {
                if s > e {
                    push(
                        DateRole::End.field_name().to_string(),
                        ValidationReason::InvertedRange {
                            start: entry.start_date().trim().to_string(),
                            end: entry.end_date().trim().to_string(),
                        },
                    );
                }
            }
        }
    }

    for (list, bullets) in entry.bullet_lists() {
        for (i, bullet) in bullets.iter().enumerate() {
            let len = bullet.chars().count();
            if len > MAX_BULLET_CHARS {
                push(
                    format!("{list}.{i}"),
                    ValidationReason::BulletTooLong {
                        len,
                        max: MAX_BULLET_CHARS,
                    },
                );
            }
        }
    }
}

/// Validates all date-bearing parts of `doc`.
pub fn validate_document(doc: &ResumeDocument, today: NaiveDate) -> Result<(), ValidationErrors> {
    let language = doc.content_language();
    let mut errors = validate_collection(CollectionKind::Experience, &doc.experience, language, today);
    errors.extend(validate_collection(
        CollectionKind::Degrees,
        &doc.education.degrees,
        language,
        today,
    ));
    if let Some(military) = &doc.military {
        validate_entry(
            CollectionKind::Military,
            0,
            military.as_ref(),
            language,
            today,
            &mut errors,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
