use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{SchemaError, SchemaErrorKind};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Dot-delimited address of one value in a résumé, e.g.
/// `experience.2.achievements.0` or `personalInfo.fullName`.
///
/// All-digit segments are list indices; everything else is a field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// First field name, which names the top-level block being edited.
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Field(name)) => name,
            _ => "",
        }
    }

    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.segments.len()
            && prefix
                .iter()
                .zip(&self.segments)
                .all(|(p, s)| matches!(s, Segment::Field(name) if name == p))
    }
}

impl FromStr for FieldPath {
    type Err = SchemaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| {
            SchemaError::new(raw, SchemaErrorKind::MalformedPath(reason.to_string()))
        };

        if raw.trim().is_empty() {
            return Err(malformed("path is empty"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(malformed("empty segment"));
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part
                    .parse::<usize>()
                    .map_err(|_| malformed("index does not fit in usize"))?;
                segments.push(Segment::Index(index));
            } else if part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                segments.push(Segment::Field(part.to_string()));
            } else {
                return Err(malformed(&format!("invalid segment '{part}'")));
            }
        }

        if matches!(segments.first(), Some(Segment::Index(_))) {
            return Err(malformed("path must start with a field name"));
        }

        Ok(FieldPath { segments })
    }
}

impl TryFrom<String> for FieldPath {
    type Error = SchemaError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
