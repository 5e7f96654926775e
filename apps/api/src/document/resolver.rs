//! Typed path traversal over the résumé schema.
//!
//! Every schema type implements [`Node`]. Writes go through `Arc::make_mut`,
//! so when the caller works on a shallow clone of a document only the `Arc`s
//! along the addressed path are copied; siblings stay pointer-equal.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::document::path::Segment;
use crate::errors::SchemaErrorKind;
use crate::models::{
    DocumentMetadata, Education, EducationEntry, ExperienceEntry, Language, LanguageEntry,
    MilitaryService, PersonalInfo, Proficiency, ResumeDocument, SkillEntry, SkillLevel, Skills,
};

type NodeResult<T> = Result<T, SchemaErrorKind>;

pub(crate) trait Node: Clone + Serialize + DeserializeOwned {
    fn read(&self, path: &[Segment]) -> NodeResult<Value> {
        match path {
            [] => encode(self),
            _ => Err(SchemaErrorKind::NotAContainer),
        }
    }

    fn write(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
        match path {
            [] => {
                *self = decode(value)?;
                Ok(())
            }
            _ => Err(SchemaErrorKind::NotAContainer),
        }
    }

    fn append(&mut self, path: &[Segment], _value: Value) -> NodeResult<()> {
        match path {
            [] => Err(SchemaErrorKind::NotAList),
            _ => Err(SchemaErrorKind::NotAContainer),
        }
    }

    fn delete(&mut self, path: &[Segment]) -> NodeResult<()> {
        match path {
            [] => Err(SchemaErrorKind::NotAList),
            _ => Err(SchemaErrorKind::NotAContainer),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> NodeResult<Value> {
    serde_json::to_value(value).map_err(|e| SchemaErrorKind::InvalidValue(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> NodeResult<T> {
    serde_json::from_value(value).map_err(|e| SchemaErrorKind::InvalidValue(e.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Scalars
// ────────────────────────────────────────────────────────────────────────────

impl Node for String {}
impl Node for SkillLevel {}
impl Node for Proficiency {}
impl Node for Language {}

// ────────────────────────────────────────────────────────────────────────────
// Containers
// ────────────────────────────────────────────────────────────────────────────

impl<T: Node> Node for Arc<T> {
    fn read(&self, path: &[Segment]) -> NodeResult<Value> {
        self.as_ref().read(path)
    }

    fn write(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
        if path.is_empty() {
            *self = Arc::new(decode(value)?);
            return Ok(());
        }
        Arc::make_mut(self).write(path, value)
    }

    fn append(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
        Arc::make_mut(self).append(path, value)
    }

    fn delete(&mut self, path: &[Segment]) -> NodeResult<()> {
        Arc::make_mut(self).delete(path)
    }
}

/// Optional fields and blocks. A missing block is never fabricated by a
/// deeper write; it has to be set as a whole first.
impl<T: Node> Node for Option<T> {
    fn read(&self, path: &[Segment]) -> NodeResult<Value> {
        if path.is_empty() {
            return encode(self);
        }
        match self {
            Some(inner) => inner.read(path),
            None => Err(SchemaErrorKind::MissingContainer),
        }
    }

    fn write(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
        if path.is_empty() {
            *self = decode(value)?;
            return Ok(());
        }
        match self {
            Some(inner) => inner.write(path, value),
            None => Err(SchemaErrorKind::MissingContainer),
        }
    }

    fn append(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
        match self {
            Some(inner) => inner.append(path, value),
            None => Err(SchemaErrorKind::MissingContainer),
        }
    }

    fn delete(&mut self, path: &[Segment]) -> NodeResult<()> {
        if path.is_empty() {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.delete(path),
            None => Err(SchemaErrorKind::MissingContainer),
        }
    }
}

impl<T: Node> Node for Vec<T> {
    fn read(&self, path: &[Segment]) -> NodeResult<Value> {
        match path {
            [] => encode(self),
            [Segment::Index(i), rest @ ..] => element(self, *i)?.read(rest),
            [Segment::Field(_), ..] => Err(SchemaErrorKind::ExpectedIndex),
        }
    }

    fn write(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
        match path {
            [] => {
                *self = decode(value)?;
                Ok(())
            }
            [Segment::Index(i), rest @ ..] => element_mut(self, *i)?.write(rest, value),
            [Segment::Field(_), ..] => Err(SchemaErrorKind::ExpectedIndex),
        }
    }

    fn append(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
        match path {
            [] => {
                self.push(decode(value)?);
                Ok(())
            }
            [Segment::Index(i), rest @ ..] => element_mut(self, *i)?.append(rest, value),
            [Segment::Field(_), ..] => Err(SchemaErrorKind::ExpectedIndex),
        }
    }

    fn delete(&mut self, path: &[Segment]) -> NodeResult<()> {
        match path {
            [] => Err(SchemaErrorKind::ExpectedIndex),
            [Segment::Index(i)] => {
                element(self, *i)?;
                self.remove(*i);
                Ok(())
            }
            [Segment::Index(i), rest @ ..] => element_mut(self, *i)?.delete(rest),
            [Segment::Field(_), ..] => Err(SchemaErrorKind::ExpectedIndex),
        }
    }
}

fn element<T>(list: &[T], index: usize) -> NodeResult<&T> {
    let len = list.len();
    list.get(index)
        .ok_or(SchemaErrorKind::IndexOutOfBounds { index, len })
}

fn element_mut<T>(list: &mut [T], index: usize) -> NodeResult<&mut T> {
    let len = list.len();
    list.get_mut(index)
        .ok_or(SchemaErrorKind::IndexOutOfBounds { index, len })
}

// ────────────────────────────────────────────────────────────────────────────
// Entity schemas
// ────────────────────────────────────────────────────────────────────────────

/// Implements [`Node`] for a struct by mapping JSON field names to Rust fields.
macro_rules! schema_node {
    ($ty:ty { $($name:literal => $field:ident),+ $(,)? }) => {
        impl Node for $ty {
            fn read(&self, path: &[Segment]) -> NodeResult<Value> {
                match path {
                    [] => encode(self),
                    [Segment::Field(name), rest @ ..] => match name.as_str() {
                        $($name => Node::read(&self.$field, rest),)+
                        other => Err(SchemaErrorKind::UnknownField(other.to_string())),
                    },
                    [Segment::Index(_), ..] => Err(SchemaErrorKind::ExpectedField),
                }
            }

            fn write(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
                match path {
                    [] => {
                        *self = decode(value)?;
                        Ok(())
                    }
                    [Segment::Field(name), rest @ ..] => match name.as_str() {
                        $($name => Node::write(&mut self.$field, rest, value),)+
                        other => Err(SchemaErrorKind::UnknownField(other.to_string())),
                    },
                    [Segment::Index(_), ..] => Err(SchemaErrorKind::ExpectedField),
                }
            }

            fn append(&mut self, path: &[Segment], value: Value) -> NodeResult<()> {
                match path {
                    [] => Err(SchemaErrorKind::NotAList),
                    [Segment::Field(name), rest @ ..] => match name.as_str() {
                        $($name => Node::append(&mut self.$field, rest, value),)+
                        other => Err(SchemaErrorKind::UnknownField(other.to_string())),
                    },
                    [Segment::Index(_), ..] => Err(SchemaErrorKind::ExpectedField),
                }
            }

            fn delete(&mut self, path: &[Segment]) -> NodeResult<()> {
                match path {
                    [] => Err(SchemaErrorKind::NotAList),
                    [Segment::Field(name), rest @ ..] => match name.as_str() {
                        $($name => Node::delete(&mut self.$field, rest),)+
                        other => Err(SchemaErrorKind::UnknownField(other.to_string())),
                    },
                    [Segment::Index(_), ..] => Err(SchemaErrorKind::ExpectedField),
                }
            }
        }
    };
}

schema_node!(ResumeDocument {
    "personalInfo" => personal_info,
    "experience" => experience,
    "education" => education,
    "skills" => skills,
    "military" => military,
    "metadata" => metadata,
});

schema_node!(PersonalInfo {
    "fullName" => full_name,
    "title" => title,
    "email" => email,
    "phone" => phone,
    "location" => location,
    "linkedin" => linkedin,
    "website" => website,
    "summary" => summary,
});

schema_node!(ExperienceEntry {
    "position" => position,
    "company" => company,
    "startDate" => start_date,
    "endDate" => end_date,
    "location" => location,
    "description" => description,
    "achievements" => achievements,
});

schema_node!(Education {
    "degrees" => degrees,
});

schema_node!(EducationEntry {
    "degreeType" => degree_type,
    "field" => field,
    "institution" => institution,
    "startDate" => start_date,
    "endDate" => end_date,
    "specialization" => specialization,
});

schema_node!(Skills {
    "technical" => technical,
    "soft" => soft,
    "languages" => languages,
});

schema_node!(SkillEntry {
    "name" => name,
    "level" => level,
});

schema_node!(LanguageEntry {
    "language" => language,
    "proficiency" => proficiency,
});

schema_node!(MilitaryService {
    "unit" => unit,
    "role" => role,
    "startDate" => start_date,
    "endDate" => end_date,
    "description" => description,
});

schema_node!(DocumentMetadata {
    "template" => template,
    "contentLanguage" => content_language,
    "interfaceLanguage" => interface_language,
});
