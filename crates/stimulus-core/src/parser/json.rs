//! JSON decoding helpers: double-decoding, stringified elements and
//! balanced-bracket extraction.

use serde_json::Value;

use super::ParsedValue;

/// How many times a JSON string is allowed to decode into more JSON.
const MAX_DECODE_DEPTH: usize = 3;

/// Decode `text` as JSON, unwrapping double-encoded payloads.
pub(crate) fn decode(text: &str) -> Option<ParsedValue> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    Some(from_value(value, 0))
}

fn from_value(value: Value, depth: usize) -> ParsedValue {
    match value {
        Value::String(s) => {
            if depth < MAX_DECODE_DEPTH {
                if let Ok(inner) = serde_json::from_str::<Value>(s.trim()) {
                    if inner.is_array() || inner.is_object() || inner.is_string() {
                        return from_value(inner, depth + 1);
                    }
                }
            }
            ParsedValue::JsonString(s)
        }
        Value::Array(items) => {
            ParsedValue::JsonArray(items.into_iter().map(decode_stringified_object).collect())
        }
        Value::Object(map) => ParsedValue::JsonObject(map),
        Value::Null => ParsedValue::LineList(Vec::new()),
        other => ParsedValue::JsonString(other.to_string()),
    }
}

/// `"{\"label\":\"cat\"}"` inside an array becomes the object it encodes.
fn decode_stringified_object(value: Value) -> Value {
    if let Value::String(s) = &value {
        let trimmed = s.trim();
        if trimmed.starts_with('{') {
            if let Ok(decoded @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
                return decoded;
            }
        }
    }
    value
}

/// The first balanced `open ... close` substring of `text`.
///
/// Candidate starts are tried left to right; brackets inside JSON string
/// literals are ignored. Returns `None` when every candidate is truncated.
pub(crate) fn first_balanced(text: &str, open: char, close: char) -> Option<&str> {
    text.match_indices(open)
        .find_map(|(start, _)| balanced_from(text, start, open, close))
}

/// Every balanced `open ... close` substring, by start position.
pub(crate) fn balanced_candidates<'a>(
    text: &'a str,
    open: char,
    close: char,
) -> impl Iterator<Item = &'a str> + 'a {
    text.match_indices(open)
        .filter_map(move |(start, _)| balanced_from(text, start, open, close))
}

/// The balanced substring beginning at byte offset `start` (which must hold `open`).
fn balanced_from(text: &str, start: usize, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(&text[start..start + offset + c.len_utf8()]);
            }
        }
    }

    None
}
