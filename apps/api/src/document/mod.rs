//! Document model and path resolver.
//!
//! Pure functions over [`ResumeDocument`]: none of them mutate their input,
//! and the returned document shares every subtree the edit did not touch.

pub mod path;
mod resolver;

use serde_json::Value;

use crate::errors::SchemaError;
use crate::models::ResumeDocument;

pub use path::{FieldPath, Segment};
use resolver::Node;

/// Reads the value at `path`.
pub fn get(doc: &ResumeDocument, path: &FieldPath) -> Result<Value, SchemaError> {
    doc.read(path.segments())
        .map_err(|kind| SchemaError::new(path.to_string(), kind))
}

/// Returns a copy of `doc` with the value at `path` replaced.
pub fn set(doc: &ResumeDocument, path: &FieldPath, value: Value) -> Result<ResumeDocument, SchemaError> {
    let mut next = doc.clone();
    next.write(path.segments(), value)
        .map_err(|kind| SchemaError::new(path.to_string(), kind))?;
    Ok(next)
}

/// Returns a copy of `doc` with `value` appended to the list at `path`.
pub fn push(doc: &ResumeDocument, path: &FieldPath, value: Value) -> Result<ResumeDocument, SchemaError> {
    let mut next = doc.clone();
    next.append(path.segments(), value)
        .map_err(|kind| SchemaError::new(path.to_string(), kind))?;
    Ok(next)
}

/// Returns a copy of `doc` without the list element (or optional value) at `path`.
pub fn remove(doc: &ResumeDocument, path: &FieldPath) -> Result<ResumeDocument, SchemaError> {
    let mut next = doc.clone();
    next.delete(path.segments())
        .map_err(|kind| SchemaError::new(path.to_string(), kind))?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::errors::SchemaErrorKind;
    use crate::test_support::sample_document;

    fn p(raw: &str) -> FieldPath {
        raw.parse().unwrap()
    }

    #[test]
    fn test_get_reads_nested_scalar() {
        let doc = sample_document();
        assert_eq!(get(&doc, &p("experience.1.company")).unwrap(), json!("Initech"));
        assert_eq!(
            get(&doc, &p("experience.0.achievements.0")).unwrap(),
            json!("Cut p99 latency by 40%")
        );
        assert_eq!(get(&doc, &p("skills.technical.0.level")).unwrap(), json!(5));
    }

    #[test]
    fn test_set_does_not_mutate_input() {
        let doc = sample_document();
        let before = doc.clone();
        let next = set(&doc, &p("experience.0.achievements.0"), json!("Shipped v2")).unwrap();

        assert_eq!(doc, before);
        assert_eq!(next.experience[0].achievements[0], "Shipped v2");
    }

    #[test]
    fn test_set_shares_untouched_subtrees() {
        let doc = sample_document();
        let next = set(&doc, &p("experience.0.position"), json!("Staff Engineer")).unwrap();

        // Off-path blocks keep reference equality.
        assert!(Arc::ptr_eq(&doc.personal_info, &next.personal_info));
        assert!(Arc::ptr_eq(&doc.education, &next.education));
        assert!(Arc::ptr_eq(&doc.skills, &next.skills));
        assert!(Arc::ptr_eq(&doc.metadata, &next.metadata));
        // Sibling entries in the edited list are shared too.
        assert!(Arc::ptr_eq(&doc.experience[1], &next.experience[1]));
        // The spine is copied.
        assert!(!Arc::ptr_eq(&doc.experience, &next.experience));
        assert!(!Arc::ptr_eq(&doc.experience[0], &next.experience[0]));
    }

    #[test]
    fn test_set_missing_optional_block_is_schema_error() {
        let doc = sample_document();
        assert!(doc.military.is_none());
        let err = set(&doc, &p("military.unit"), json!("8200")).unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::MissingContainer);
        assert_eq!(err.path, "military.unit");
    }

    #[test]
    fn test_set_whole_optional_block_then_field() {
        let doc = sample_document();
        let with_block = set(&doc, &p("military"), json!({ "unit": "Armor", "startDate": "2010" })).unwrap();
        let next = set(&with_block, &p("military.role"), json!("Commander")).unwrap();
        let military = next.military.as_ref().unwrap();
        assert_eq!(military.unit, "Armor");
        assert_eq!(military.role, "Commander");
    }

    #[test]
    fn test_out_of_bounds_index_does_not_fabricate() {
        let doc = sample_document();
        let err = set(&doc, &p("experience.7.position"), json!("x")).unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::IndexOutOfBounds { index: 7, len: 2 });
    }

    #[test]
    fn test_unknown_field_and_type_mismatch() {
        let doc = sample_document();
        let err = set(&doc, &p("experience.0.salary"), json!(1)).unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::UnknownField("salary".to_string()));

        let err = set(&doc, &p("experience.0.position"), json!(42)).unwrap_err();
        assert!(matches!(err.kind, SchemaErrorKind::InvalidValue(_)));
    }

    #[test]
    fn test_entity_write_rejects_unknown_keys() {
        let doc = sample_document();
        let err = set(&doc, &p("experience.0"), json!({ "postion": "Lead" })).unwrap_err();
        assert!(matches!(err.kind, SchemaErrorKind::InvalidValue(ref msg) if msg.contains("postion")));

        let err = push(&doc, &p("education.degrees"), json!({ "school": "TAU" })).unwrap_err();
        assert!(matches!(err.kind, SchemaErrorKind::InvalidValue(_)));

        // Partial objects still fill the remaining fields with defaults.
        let next = set(&doc, &p("experience.0"), json!({ "position": "Lead" })).unwrap();
        assert_eq!(next.experience[0].position, "Lead");
        assert!(next.experience[0].company.is_empty());
    }

    #[test]
    fn test_skill_level_bounds_enforced_at_boundary() {
        let doc = sample_document();
        let err = set(&doc, &p("skills.technical.0.level"), json!(9)).unwrap_err();
        assert!(matches!(err.kind, SchemaErrorKind::InvalidValue(_)));
        let next = set(&doc, &p("skills.technical.0.level"), json!(2)).unwrap();
        assert_eq!(next.skills.technical[0].level.get(), 2);
    }

    #[test]
    fn test_index_into_scalar_is_rejected() {
        let doc = sample_document();
        let err = get(&doc, &p("personalInfo.fullName.0")).unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::NotAContainer);
    }

    #[test]
    fn test_push_appends_entry_and_shares_existing_ones() {
        let doc = sample_document();
        let next = push(
            &doc,
            &p("experience"),
            json!({ "position": "Lead", "company": "Globex", "startDate": "2022", "endDate": "2023" }),
        )
        .unwrap();

        assert_eq!(doc.experience.len(), 2);
        assert_eq!(next.experience.len(), 3);
        assert_eq!(next.experience[2].company, "Globex");
        assert!(Arc::ptr_eq(&doc.experience[0], &next.experience[0]));
    }

    #[test]
    fn test_push_onto_bullet_list() {
        let doc = sample_document();
        let next = push(&doc, &p("experience.1.description"), json!("Maintained TPS reports")).unwrap();
        assert_eq!(next.experience[1].description.last().unwrap(), "Maintained TPS reports");
    }

    #[test]
    fn test_push_onto_scalar_is_rejected() {
        let doc = sample_document();
        let err = push(&doc, &p("personalInfo.title"), json!("x")).unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::NotAList);
    }

    #[test]
    fn test_remove_entry_and_optional_value() {
        let doc = sample_document();
        let next = remove(&doc, &p("experience.0")).unwrap();
        assert_eq!(next.experience.len(), 1);
        assert_eq!(next.experience[0].company, "Initech");

        let next = remove(&doc, &p("experience.0.location")).unwrap();
        assert!(next.experience[0].location.is_none());

        let err = remove(&doc, &p("experience.5")).unwrap_err();
        assert!(matches!(err.kind, SchemaErrorKind::IndexOutOfBounds { .. }));
    }
}
