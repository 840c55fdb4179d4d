//! Label-only programs: Tacting, Listener Responding, Seriation, Sorting.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{field_text, unescape_fragment, value_text};
use crate::fields::RequestFields;
use crate::parser::{split_lines, ParsedValue, Shape};
use crate::text::{normalize_label, same_label, strip_list_noise};
use crate::types::LabelStimulus;

/// Keys a label may hide under, in priority order.
pub(crate) const LABEL_KEYS: &[&str] = &[
    "label", "name", "value", "text", "word", "item", "stimulus", "target",
];

lazy_static! {
    /// `"label": "..."` anywhere in the raw text, escapes included.
    static ref LABEL_FRAGMENT: Regex = Regex::new(
        r#""label"\s*:\s*"((?:[^"\\]|\\.)*)""#
    ).unwrap();

    /// A complete JSON string literal.
    static ref STRING_LITERAL: Regex = Regex::new(
        r#""((?:[^"\\]|\\.)*)""#
    ).unwrap();
}

pub(crate) fn normalize(
    parsed: &ParsedValue,
    fields: &RequestFields,
    raw: &str,
) -> Vec<LabelStimulus> {
    let shape = parsed.shape();

    let structured: Vec<String> = match &shape {
        Shape::StringArray(items) => items.iter().flat_map(|s| item_lines(s)).collect(),
        Shape::ObjectArray(objects) => objects
            .iter()
            .filter_map(|o| field_text(o, LABEL_KEYS))
            .collect(),
        Shape::Scalar(_) | Shape::Unparseable(_) => Vec::new(),
    };

    let candidates = if !structured.is_empty() {
        structured
    } else {
        let fragments = label_fragments(raw);
        let literals = open_array_strings(raw);
        if !fragments.is_empty() {
            debug!(count = fragments.len(), "Recovered label fragments");
            fragments
        } else if !literals.is_empty() {
            debug!(count = literals.len(), "Recovered strings from an open array");
            literals
        } else {
            match shape {
                Shape::Scalar(value) => scalar_labels(&value),
                Shape::Unparseable(lines) => lines,
                Shape::StringArray(_) | Shape::ObjectArray(_) => Vec::new(),
            }
        }
    };

    finish(candidates, fields.num_trials())
}

/// `{"label":"..."}` fragments from truncated or concatenated output.
fn label_fragments(raw: &str) -> Vec<String> {
    LABEL_FRAGMENT
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_fragment(m.as_str()))
        .collect()
}

/// Complete string elements of a string array that was cut off. The
/// unterminated last element is dropped.
fn open_array_strings(raw: &str) -> Vec<String> {
    let Some(open) = raw.find('[') else {
        return Vec::new();
    };
    let rest = &raw[open + 1..];
    if !rest.trim_start().starts_with('"') {
        return Vec::new();
    }

    STRING_LITERAL
        .captures_iter(rest)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_fragment(m.as_str()))
        .collect()
}

/// A string array element, split if the model packed lines into it.
fn item_lines(item: &str) -> Vec<String> {
    if item.contains('\n') {
        split_lines(item)
    } else {
        vec![strip_list_noise(item).to_string()]
    }
}

/// Labels from a lone object or string.
fn scalar_labels(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => split_lines(s),
        Value::Object(map) => {
            let mut labels = Vec::new();
            for (key, value) in map {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            match item {
                                Value::Object(o) => labels.extend(field_text(o, LABEL_KEYS)),
                                other => labels.extend(value_text(other)),
                            }
                        }
                    }
                    other if LABEL_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)) => {
                        labels.extend(value_text(other));
                    }
                    _ => {}
                }
            }
            labels
        }
        _ => Vec::new(),
    }
}

/// Normalize, drop empties and duplicates, cap at `limit`.
fn finish(candidates: Vec<String>, limit: usize) -> Vec<LabelStimulus> {
    let produced = candidates.len();
    let mut labels: Vec<String> = Vec::with_capacity(limit.min(produced));

    for candidate in candidates {
        let label = normalize_label(&candidate);
        if label.is_empty() || labels.iter().any(|l| same_label(l, &label)) {
            continue;
        }
        if labels.len() == limit {
            break;
        }
        labels.push(label);
    }

    if produced > labels.len() {
        debug!(produced, kept = labels.len(), limit, "Dropped surplus or duplicate labels");
    }

    labels.into_iter().map(|label| LabelStimulus { label }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(raw: &str, trials: usize) -> Vec<String> {
        let fields = RequestFields::new().with("numTrials", trials);
        normalize(&parse(raw), &fields, raw)
            .into_iter()
            .map(|s| s.label)
            .collect()
    }

    #[test]
    fn test_object_array_labels() {
        assert_eq!(run(r#"[{"label":"cat"}, {"label":"dog"}]"#, 12), vec!["Cat", "Dog"]);
        assert_eq!(
            run(r#"[{"name":"cat"}, {"Value":"dog"}, {"stimulus":"bird"}, {"other":1}]"#, 12),
            vec!["Cat", "Dog", "Bird"]
        );
    }

    #[test]
    fn test_string_array_and_mixed() {
        assert_eq!(run(r#"["cat", " ", "dog"]"#, 12), vec!["Cat", "Dog"]);
        assert_eq!(run(r#"[{"label":"cat"}, "dog"]"#, 12), vec!["Cat", "Dog"]);
        assert_eq!(run(r#"["- cat\n- dog"]"#, 12), vec!["Cat", "Dog"]);
    }

    #[test]
    fn test_truncated_array_uses_fragments() {
        let raw = r#"[{"label":"cat"},{"label":"dog"},{"label":"bi"#;
        assert_eq!(run(raw, 12), vec!["Cat", "Dog"]);

        let concatenated = r#"{"label":"cat"}{"label":"dog"}"#;
        assert_eq!(run(concatenated, 12), vec!["Cat", "Dog"]);
    }

    #[test]
    fn test_truncated_string_array_keeps_complete_elements() {
        assert_eq!(run(r#"["cat", "dog", "bi"#, 12), vec!["Cat", "Dog"]);
        assert_eq!(
            run("Sure:\n[\n  \"red apple\",\n  \"say \\\"hi\\\"\",\n  \"gre", 12),
            vec!["Red apple", "Say \"hi\""]
        );
    }

    #[test]
    fn test_scalar_object_collects_arrays() {
        assert_eq!(run(r#"{"animals": ["dog", "cat"], "note": "x"}"#, 12), vec!["Dog", "Cat"]);
        assert_eq!(run(r#"{"name": "solo"}"#, 12), vec!["Solo"]);
    }

    #[test]
    fn test_lines_fallback() {
        assert_eq!(run("Here are some:\n- cat\n- dog", 12), vec!["Cat", "Dog"]);
    }

    #[test]
    fn test_dedup_and_truncate() {
        assert_eq!(run(r#"["cat", "Cat", "CAT", "dog"]"#, 12), vec!["Cat", "Dog"]);
        assert_eq!(run(r#"["a", "b", "c", "d"]"#, 2), vec!["A", "B"]);
    }

    #[test]
    fn test_shortfall_is_not_filled() {
        assert_eq!(run(r#"["cat"]"#, 5), vec!["Cat"]);
        assert!(run("[]", 5).is_empty());
    }
}
