use serde::{Deserialize, Serialize};

use crate::document::FieldPath;

/// Top-level editor panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    #[default]
    PersonalInfo,
    Experience,
    Education,
    Skills,
    Military,
    Metadata,
}

impl Section {
    /// The panel that owns the field at `path`.
    pub fn of(path: &FieldPath) -> Option<Section> {
        match path.root() {
            "personalInfo" => Some(Section::PersonalInfo),
            "experience" => Some(Section::Experience),
            "education" => Some(Section::Education),
            "skills" => Some(Section::Skills),
            "military" => Some(Section::Military),
            "metadata" => Some(Section::Metadata),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormattingMode {
    #[default]
    Rich,
    Plain,
}

/// Per-session ambient state of the editor surface. Lives on the session,
/// so two sessions never observe each other's font or section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorState {
    pub active_section: Section,
    pub font: String,
    pub formatting: FormattingMode,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            active_section: Section::default(),
            font: "Inter".to_string(),
            formatting: FormattingMode::default(),
        }
    }
}
