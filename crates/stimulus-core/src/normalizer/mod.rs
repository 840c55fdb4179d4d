//! Program-specific normalization of parsed completions.
//!
//! Normalizers never fail. Whatever the parser recovered is mapped into
//! the program's [`StimulusSet`] variant; for VPMTS the result is padded
//! or truncated to exactly the requested grid.

mod intraverbal;
mod labels;
pub mod tables;
mod vpmts;

use serde_json::{Map, Value};

use crate::fields::RequestFields;
use crate::parser::ParsedValue;
use crate::types::{ProgramType, StimulusSet};

/// Normalize a parsed completion for `program`.
///
/// `raw` is the unmodified completion text, scanned for JSON fragments
/// when nothing structured was recovered.
pub fn normalize(
    program: ProgramType,
    parsed: &ParsedValue,
    fields: &RequestFields,
    raw: &str,
) -> StimulusSet {
    match program {
        ProgramType::Tacting
        | ProgramType::ListenerResponding
        | ProgramType::Seriation
        | ProgramType::Sorting => StimulusSet::Labels(labels::normalize(parsed, fields, raw)),
        ProgramType::Intraverbal => {
            StimulusSet::Intraverbal(intraverbal::normalize(parsed, fields, raw))
        }
        ProgramType::Vpmts => StimulusSet::Vpmts(vpmts::normalize(parsed, fields, raw)),
    }
}

/// The first alias (case-insensitive) holding a value.
fn field_value<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(alias))
            .map(|(_, value)| value)
    })
}

/// The first alias holding non-empty text. Numbers count as text.
fn field_text(object: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| field_value(object, &[*alias]).and_then(value_text))
}

/// Trimmed, non-empty text of a string or number.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Decode JSON escapes in a regex-captured string body.
fn unescape_fragment(body: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{body}\"")).unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    #[test]
    fn test_dispatch_by_program() {
        let parsed = parse(r#"["cat", "dog"]"#);
        let fields = RequestFields::new();

        for program in [
            ProgramType::Tacting,
            ProgramType::ListenerResponding,
            ProgramType::Seriation,
            ProgramType::Sorting,
        ] {
            assert!(matches!(normalize(program, &parsed, &fields, ""), StimulusSet::Labels(_)));
        }
        assert!(matches!(
            normalize(ProgramType::Intraverbal, &parsed, &fields, ""),
            StimulusSet::Intraverbal(_)
        ));
        assert!(matches!(
            normalize(ProgramType::Vpmts, &parsed, &fields, ""),
            StimulusSet::Vpmts(_)
        ));
    }

    #[test]
    fn test_field_text_is_case_insensitive_and_ordered() {
        let object = json!({"Name": "first", "LABEL": " second "});
        let Value::Object(map) = object else { unreachable!() };
        assert_eq!(field_text(&map, &["label", "name"]), Some("second".into()));
        assert_eq!(field_text(&map, &["name", "label"]), Some("first".into()));
        assert_eq!(field_text(&map, &["missing"]), None);
    }

    #[test]
    fn test_unescape_fragment() {
        assert_eq!(unescape_fragment(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape_fragment(r"broken \q"), r"broken \q");
    }
}
