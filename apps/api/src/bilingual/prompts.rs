// Prompts for the translation collaborator.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::Language;

pub fn translation_system() -> String {
    format!(
        "{JSON_ONLY_SYSTEM} You translate résumé documents between languages. \
         You keep the JSON structure, keys and array order exactly as given and \
         translate only human-readable values."
    )
}

/// Builds the user prompt for translating `document_json` from `source` into `target`.
pub fn build_translation_prompt(source: Language, target: Language, document_json: &str) -> String {
    format!(
        r#"Translate this résumé from {source_name} to {target_name}.

RULES:
- Return the complete document as a single JSON object with the same keys.
- Do not translate dates. Dates are a 4-digit year or MM/YYYY and must stay unchanged.
- An end date of {source_ongoing} means the role is ongoing; write it as "{target_ongoing}".
- Set metadata.contentLanguage to "{target_code}". Leave every other metadata value unchanged.
- Keep each description and achievement bullet at most 220 characters; shorten if needed.
- Keep skill levels, emails, phone numbers and URLs unchanged.

DOCUMENT:
{document_json}"#,
        source_name = source.display_name(),
        target_name = target.display_name(),
        source_ongoing = source
            .ongoing_sentinels()
            .iter()
            .map(|s| format!("\"{s}\""))
            .collect::<Vec<_>>()
            .join(", "),
        target_ongoing = target.canonical_sentinel(),
        target_code = target.code(),
    )
}
