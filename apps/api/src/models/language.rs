use std::fmt;

use serde::{Deserialize, Serialize};

/// Content / interface language of a résumé.
///
/// Closed set: each language carries its own vocabulary of "ongoing" end-date
/// tokens, and the translation collaborator only targets languages listed here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "he")]
    Hebrew,
}

const ENGLISH_ONGOING: &[&str] = &["Present", "Current", "Now", "Ongoing"];
const HEBREW_ONGOING: &[&str] = &["היום", "כיום", "הווה", "עד היום"];

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hebrew => "he",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hebrew => "Hebrew",
        }
    }

    /// Tokens that mean "still ongoing" when used as an end date.
    pub fn ongoing_sentinels(&self) -> &'static [&'static str] {
        match self {
            Language::English => ENGLISH_ONGOING,
            Language::Hebrew => HEBREW_ONGOING,
        }
    }

    /// The token written by the editor (and requested from the translator).
    pub fn canonical_sentinel(&self) -> &'static str {
        self.ongoing_sentinels()[0]
    }

    pub fn is_ongoing_sentinel(&self, token: &str) -> bool {
        let token = token.trim();
        match self {
            Language::English => ENGLISH_ONGOING
                .iter()
                .any(|s| s.eq_ignore_ascii_case(token)),
            Language::Hebrew => HEBREW_ONGOING.iter().any(|s| *s == token),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
