//! Helpers for turning loosely-typed request payloads into domain drafts.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("valid whitespace run regex"));

/// Treats blank strings the same as absent fields.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Collects wire names of the fields flagged as absent, in declaration order.
pub(crate) fn missing_fields(checks: &[(&'static str, bool)]) -> Vec<&'static str> {
    checks
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect()
}

pub(crate) fn parse_id(field: &'static str, value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| ValidationError::InvalidId {
        field,
        value: value.to_string(),
    })
}

/// Trims and collapses whitespace runs to a single space.
pub fn sanitize_text(value: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(value.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{missing_fields, non_blank, parse_id, sanitize_text};
    use crate::error::ValidationError;

    #[test]
    fn sanitize_text_trims_and_collapses_runs() {
        assert_eq!(sanitize_text("  morning   walk \t in  park  "), "morning walk in park");
        assert_eq!(sanitize_text("single"), "single");
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some(" x ".to_string())), Some(" x ".to_string()));
        assert_eq!(
            missing_fields(&[("title", true), ("startDatetime", false), ("endDatetime", true)]),
            vec!["title", "endDatetime"]
        );
    }

    #[test]
    fn parse_id_reports_field_name() {
        let err = parse_id("patientId", "not-a-uuid").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidId {
                field: "patientId",
                value: "not-a-uuid".to_string()
            }
        );
    }
}
