use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{Language, ResumeDocument};
use crate::models::resume::SharedList;
use crate::timeline::dates::{DateInput, DateValue};
use crate::timeline::{CollectionKind, Dated};

fn start_key<T: Dated>(entry: &T, language: Language, today: NaiveDate) -> Option<NaiveDate> {
    match DateInput::classify(entry.start_date(), language) {
        DateInput::Parsed(DateValue::Ongoing) => None,
        DateInput::Parsed(value) => value.timestamp(today),
        DateInput::Empty | DateInput::Raw(_) => None,
    }
}

/// Newest first; entries without a usable start date go last.
fn newest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts a collection descending by start date. The sort is stable, so
/// entries with equal start dates keep their relative order.
///
/// Returns `None` when the collection is already in order, letting callers
/// keep the original `Arc` (and its identity) untouched.
pub fn sort_collection<T: Dated>(
    entries: &SharedList<T>,
    language: Language,
    today: NaiveDate,
) -> Option<SharedList<T>> {
    let mut keyed: Vec<(usize, Option<NaiveDate>)> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (i, start_key(e.as_ref(), language, today)))
        .collect();
    keyed.sort_by(|(_, a), (_, b)| newest_first(*a, *b));

    if keyed.iter().enumerate().all(|(pos, (i, _))| pos == *i) {
        return None;
    }

    let sorted = keyed
        .into_iter()
        .map(|(i, _)| Arc::clone(&entries[i]))
        .collect();
    Some(Arc::new(sorted))
}

/// Re-sorts one repeatable collection of `doc`, sharing everything else.
pub fn sort_in_document(doc: &ResumeDocument, kind: CollectionKind, today: NaiveDate) -> ResumeDocument {
    let language = doc.content_language();
    let mut next = doc.clone();
    match kind {
        CollectionKind::Experience => {
            if let Some(sorted) = sort_collection(&doc.experience, language, today) {
                next.experience = sorted;
            }
        }
        CollectionKind::Degrees => {
            if let Some(sorted) = sort_collection(&doc.education.degrees, language, today) {
                Arc::make_mut(&mut next.education).degrees = sorted;
            }
        }
        CollectionKind::Military => {}
    }
    next
}

/// Sorts every repeatable collection. Used on load and before persistence.
pub fn normalize_document(doc: &ResumeDocument, today: NaiveDate) -> ResumeDocument {
    CollectionKind::REPEATABLE
        .into_iter()
        .fold(doc.clone(), |next, kind| sort_in_document(&next, kind, today))
}
