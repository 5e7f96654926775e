//! Canonical résumé schema.
//!
//! Every nested block and every repeatable entry sits behind an `Arc` so that a
//! path edit only reallocates the spine from the root to the changed leaf. Two
//! history snapshots that differ in one bullet share every other entry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::language::Language;

/// A shared, immutable subtree.
pub type Shared<T> = Arc<T>;
/// A repeatable collection whose elements are shared individually.
pub type SharedList<T> = Arc<Vec<Arc<T>>>;

/// Maximum characters in one description or achievement bullet.
pub const MAX_BULLET_CHARS: usize = 220;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ResumeDocument {
    pub personal_info: Shared<PersonalInfo>,
    pub experience: SharedList<ExperienceEntry>,
    pub education: Shared<Education>,
    pub skills: Shared<Skills>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub military: Option<Shared<MilitaryService>>,
    pub metadata: Shared<DocumentMetadata>,
}

impl ResumeDocument {
    pub fn content_language(&self) -> Language {
        self.metadata.content_language
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PersonalInfo {
    pub full_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub website: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ExperienceEntry {
    pub position: String,
    pub company: String,
    pub start_date: String,
    /// Either a date or one of the content language's ongoing sentinels.
    pub end_date: String,
    pub location: Option<String>,
    pub description: Vec<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Education {
    pub degrees: SharedList<EducationEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EducationEntry {
    pub degree_type: String,
    pub field: String,
    pub institution: String,
    pub start_date: String,
    pub end_date: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Skills {
    pub technical: SharedList<SkillEntry>,
    pub soft: SharedList<SkillEntry>,
    pub languages: SharedList<LanguageEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SkillEntry {
    pub name: String,
    pub level: SkillLevel,
}

/// Skill level on a 1–5 scale. Out-of-range values are rejected on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SkillLevel(u8);

impl SkillLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Result<Self, String> {
        Self::try_from(level)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel(3)
    }
}

impl TryFrom<u8> for SkillLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(SkillLevel(level))
        } else {
            Err(format!(
                "skill level must be between {} and {}, got {level}",
                Self::MIN,
                Self::MAX
            ))
        }
    }
}

impl From<SkillLevel> for u8 {
    fn from(level: SkillLevel) -> Self {
        level.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LanguageEntry {
    pub language: String,
    pub proficiency: Proficiency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proficiency {
    Native,
    Fluent,
    Advanced,
    #[default]
    Intermediate,
    Basic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MilitaryService {
    pub unit: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DocumentMetadata {
    pub template: String,
    pub content_language: Language,
    pub interface_language: Language,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            template: "classic".to_string(),
            content_language: Language::default(),
            interface_language: Language::default(),
        }
    }
}
