//! Completion repair.
//!
//! Models are asked for a raw JSON array but routinely return fenced
//! blocks, prose-wrapped arrays, double-encoded strings, truncated output
//! or plain lists. [`parse`] is total: it walks an ordered list of
//! strategies and the last one always yields a line list.

mod json;
mod strategies;

use serde_json::{Map, Value};
use tracing::debug;

pub use strategies::{clean_item, split_lines, Strategy, StrategyKind, STRATEGIES};

const FENCE: &str = "```";

/// Wrapper keys a model may hide its payload under.
const WRAPPER_KEYS: &[&str] = &[
    "items",
    "stimuli",
    "labels",
    "data",
    "results",
    "pairs",
    "questions",
    "groups",
    "categories",
    "list",
    "output",
    "response",
];

/// Fence language tags skipped when they sit inline with the payload.
const LANGUAGE_TAGS: &[&str] = &["json", "javascript", "js", "text", "txt", "plaintext"];

/// Result of repairing a raw completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    JsonArray(Vec<Value>),
    JsonObject(Map<String, Value>),
    JsonString(String),
    /// Cleaned, non-empty lines
    LineList(Vec<String>),
}

/// What a parsed value looks like to a normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Array of scalars, rendered as text
    StringArray(Vec<String>),
    /// Array of objects; bare strings lifted to `{"label": s}`
    ObjectArray(Vec<Map<String, Value>>),
    /// A lone object or string
    Scalar(Value),
    /// Plain lines, nothing structured recovered
    Unparseable(Vec<String>),
}

impl ParsedValue {
    /// Classify the value for normalization.
    pub fn shape(&self) -> Shape {
        match self {
            ParsedValue::JsonArray(items) => array_shape(items),
            ParsedValue::JsonObject(map) => object_shape(map),
            ParsedValue::JsonString(s) => Shape::Scalar(Value::String(s.clone())),
            ParsedValue::LineList(lines) => Shape::Unparseable(lines.clone()),
        }
    }
}

/// Parse a raw completion. Never fails.
pub fn parse(raw: &str) -> ParsedValue {
    parse_traced(raw).0
}

/// Parse a raw completion, also reporting which strategy succeeded.
pub fn parse_traced(raw: &str) -> (ParsedValue, StrategyKind) {
    let prepared = prepare(raw);

    for (kind, strategy) in STRATEGIES {
        if let Some(value) = strategy(&prepared) {
            debug!(strategy = kind.name(), input_len = raw.len(), "Parsed completion");
            return (value, *kind);
        }
    }

    (
        ParsedValue::LineList(split_lines(&prepared)),
        StrategyKind::BulletLines,
    )
}

/// Drop fence lines (`` ``` `` and `` ```lang ``) from prose, keeping everything else.
pub fn remove_fence_lines(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with(FENCE))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Fence extraction, trimming and unquoting.
fn prepare(raw: &str) -> String {
    match fenced_body(raw) {
        Some(body) => unquote(body),
        None => unquote(&remove_fence_lines(raw)),
    }
}

/// Trimmed body of the first fenced block. An unterminated fence runs to
/// the end. `None` when there is no fence, when the block is empty, or when
/// an odd fence count follows text, as with a lone closing fence after the
/// payload.
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let unpaired = text.matches(FENCE).count() % 2 == 1;
    if unpaired && !text[..open].trim().is_empty() {
        return None;
    }

    let rest = skip_language_tag(&text[open + FENCE.len()..]);
    let body = match rest.find(FENCE) {
        Some(close) => &rest[..close],
        None => rest,
    };
    Some(body.trim()).filter(|b| !b.is_empty())
}

fn skip_language_tag(rest: &str) -> &str {
    let line_end = rest.find('\n').unwrap_or(rest.len());
    let first_line = rest[..line_end].trim();

    if line_end < rest.len()
        && first_line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return &rest[line_end + 1..];
    }

    let trimmed = rest.trim_start();
    let word_end = trimmed
        .find(|c: char| c.is_whitespace() || c == '[' || c == '{')
        .unwrap_or(trimmed.len());
    if LANGUAGE_TAGS.contains(&trimmed[..word_end].to_ascii_lowercase().as_str()) {
        &trimmed[word_end..]
    } else {
        rest
    }
}

/// Remove one layer of surrounding quotes. JSON string literals are decoded.
fn unquote(text: &str) -> String {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        if let Ok(decoded) = serde_json::from_str::<String>(text) {
            return decoded.trim().to_string();
        }
    }

    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            let inner = &text[1..text.len() - 1];
            if !inner.contains(quote) {
                return inner.trim().to_string();
            }
        }
    }

    text.to_string()
}

fn array_shape(items: &[Value]) -> Shape {
    let all_scalar = items
        .iter()
        .filter(|v| !v.is_null())
        .all(|v| v.is_string() || v.is_number() || v.is_boolean());

    if all_scalar {
        return Shape::StringArray(items.iter().filter_map(scalar_text).collect());
    }

    let mut objects = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(map) => objects.push(map.clone()),
            Value::Array(inner) => {
                for nested in inner {
                    match nested {
                        Value::Object(map) => objects.push(map.clone()),
                        other => objects.extend(scalar_text(other).map(lift_label)),
                    }
                }
            }
            other => objects.extend(scalar_text(other).map(lift_label)),
        }
    }
    Shape::ObjectArray(objects)
}

fn object_shape(map: &Map<String, Value>) -> Shape {
    let wrapped = map.iter().find_map(|(key, value)| {
        let key = key.to_ascii_lowercase();
        WRAPPER_KEYS.contains(&key.as_str()).then_some(value)
    });

    match wrapped {
        Some(Value::Array(items)) => return array_shape(items),
        Some(Value::Object(inner)) => return object_shape(inner),
        _ => {}
    }

    // `{"anything": [{...}, {...}]}`
    if map.len() == 1 {
        if let Some(Value::Array(items)) = map.values().next() {
            if items.iter().any(Value::is_object) {
                return array_shape(items);
            }
        }
    }

    Shape::Scalar(Value::Object(map.clone()))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lift_label(label: String) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("label".to_string(), Value::String(label));
    map
}
