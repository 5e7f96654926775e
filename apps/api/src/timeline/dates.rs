//! Date values accepted in date-bearing entries: `YYYY`, `MM/YYYY`, or an
//! ongoing sentinel of the document's content language.

use std::borrow::Cow;

use chrono::{Datelike, NaiveDate};

use crate::errors::ValidationReason;
use crate::models::Language;

pub const MIN_YEAR: i32 = 1900;

/// A syntactically recognised date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Year(i32),
    MonthYear { month: u32, year: i32 },
    Ongoing,
}

/// Outcome of reading raw date text. Unrecognised input is kept verbatim as
/// `Raw` so callers must decide what to do with it instead of silently
/// treating it as a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput<'a> {
    Empty,
    Parsed(DateValue),
    Raw(&'a str),
}

/// Which side of a range a value sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRole {
    Start,
    End,
}

impl DateRole {
    pub fn field_name(&self) -> &'static str {
        match self {
            DateRole::Start => "startDate",
            DateRole::End => "endDate",
        }
    }
}

impl<'a> DateInput<'a> {
    pub fn classify(raw: &'a str, language: Language) -> DateInput<'a> {
        let text = raw.trim();
        if text.is_empty() {
            return DateInput::Empty;
        }
        if language.is_ongoing_sentinel(text) {
            return DateInput::Parsed(DateValue::Ongoing);
        }

        let bytes = text.as_bytes();
        let all_digits = |s: &[u8]| s.iter().all(u8::is_ascii_digit);

        if bytes.len() == 4 && all_digits(bytes) {
            if let Ok(year) = text.parse() {
                return DateInput::Parsed(DateValue::Year(year));
            }
        }
        if bytes.len() == 7 && bytes[2] == b'/' && all_digits(&bytes[..2]) && all_digits(&bytes[3..]) {
            if let (Ok(month), Ok(year)) = (text[..2].parse(), text[3..].parse()) {
                return DateInput::Parsed(DateValue::MonthYear { month, year });
            }
        }
        DateInput::Raw(text)
    }
}

impl DateValue {
    /// The point in time used for range comparison and ordering. A bare
    /// year compares as January 1st; ongoing compares as `today`.
    pub fn timestamp(&self, today: NaiveDate) -> Option<NaiveDate> {
        match *self {
            DateValue::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
            DateValue::MonthYear { month, year } => NaiveDate::from_ymd_opt(year, month, 1),
            DateValue::Ongoing => Some(today),
        }
    }

    /// Applies the per-value rules: year bounds, month range, no future
    /// dates, ongoing only as an end date.
    pub fn check(&self, role: DateRole, today: NaiveDate) -> Result<(), ValidationReason> {
        let current_year = today.year();
        let year_in_range = |year: i32| {
            if (MIN_YEAR..=current_year).contains(&year) {
                Ok(())
            } else {
                Err(ValidationReason::YearOutOfRange {
                    year,
                    min: MIN_YEAR,
                    max: current_year,
                })
            }
        };

        match *self {
            DateValue::Ongoing => match role {
                DateRole::End => Ok(()),
                DateRole::Start => Err(ValidationReason::OngoingStart),
            },
            DateValue::Year(year) => year_in_range(year),
            DateValue::MonthYear { month, year } => {
                if !(1..=12).contains(&month) {
                    return Err(ValidationReason::InvalidMonth { month });
                }
                if year < MIN_YEAR {
                    return year_in_range(year);
                }
                if (year, month) > (current_year, today.month()) {
                    return Err(ValidationReason::FutureDate {
                        value: format!("{month:02}/{year}"),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Reads and checks one raw date. `Ok(None)` means the field is still empty.
pub fn check_date(
    raw: &str,
    role: DateRole,
    language: Language,
    today: NaiveDate,
) -> Result<Option<DateValue>, ValidationReason> {
    match DateInput::classify(raw, language) {
        DateInput::Empty => Ok(None),
        DateInput::Raw(text) => Err(ValidationReason::Malformed {
            value: text.to_string(),
        }),
        DateInput::Parsed(value) => {
            value.check(role, today)?;
            Ok(Some(value))
        }
    }
}

/// Turns a bare two-digit month (`"03"`) into the `MM/` prefix the user is
/// about to type. Anything else is returned untouched.
pub fn autocomplete_month(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if bytes.len() == 2 && bytes.iter().all(u8::is_ascii_digit) {
        if let Ok(month) = input.parse::<u32>() {
            if (1..=12).contains(&month) {
                return Cow::Owned(format!("{input}/"));
            }
        }
    }
    Cow::Borrowed(input)
}
