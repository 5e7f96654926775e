//! Temporal validation and chronological ordering of date-bearing entries.

pub mod dates;
pub mod sorter;
pub mod validator;

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::models::{EducationEntry, ExperienceEntry, MilitaryService};

pub use dates::autocomplete_month;
pub use sorter::{normalize_document, sort_in_document};
pub use validator::validate_document;

/// Source of "today" for year bounds, future-date checks and ongoing ranges.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// The date-bearing parts of a résumé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CollectionKind {
    #[serde(rename = "experience")]
    Experience,
    #[serde(rename = "education.degrees")]
    Degrees,
    #[serde(rename = "military")]
    Military,
}

impl CollectionKind {
    /// Collections kept in descending start-date order.
    pub const REPEATABLE: [CollectionKind; 2] = [CollectionKind::Experience, CollectionKind::Degrees];
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CollectionKind::Experience => "experience",
            CollectionKind::Degrees => "education.degrees",
            CollectionKind::Military => "military",
        })
    }
}

/// An entry with a start/end range and optional bullet lists.
pub trait Dated {
    fn start_date(&self) -> &str;
    fn end_date(&self) -> &str;

    fn bullet_lists(&self) -> Vec<(&'static str, &[String])> {
        Vec::new()
    }
}

impl Dated for ExperienceEntry {
    fn start_date(&self) -> &str {
        &self.start_date
    }

    fn end_date(&self) -> &str {
        &self.end_date
    }

    fn bullet_lists(&self) -> Vec<(&'static str, &[String])> {
        vec![
            ("description", self.description.as_slice()),
            ("achievements", self.achievements.as_slice()),
        ]
    }
}

impl Dated for EducationEntry {
    fn start_date(&self) -> &str {
        &self.start_date
    }

    fn end_date(&self) -> &str {
        &self.end_date
    }
}

impl Dated for MilitaryService {
    fn start_date(&self) -> &str {
        &self.start_date
    }

    fn end_date(&self) -> &str {
        &self.end_date
    }

    fn bullet_lists(&self) -> Vec<(&'static str, &[String])> {
        vec![("description", self.description.as_slice())]
    }
}
