//! Individual parse strategies.
//!
//! Each strategy is a pure function from prepared text to an optional
//! value. [`STRATEGIES`] fixes their order: structured JSON first, then
//! increasingly heuristic line handling. The last strategy always succeeds.

use lazy_static::lazy_static;
use regex::Regex;

use super::json::{balanced_candidates, decode, first_balanced};
use super::ParsedValue;
use crate::text::strip_list_noise;

/// Identifies which strategy produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// The whole text is JSON
    DirectJson,
    /// First balanced `[...]` substring
    BalancedArray,
    /// First balanced `{...}` substring
    BalancedObject,
    /// Single line of the shape `1. X, 2. Y, 3. Z`
    NumberedList,
    /// Every line is `Label: ...`
    LabelLines,
    /// A JSON array literal embedded in one line
    EmbeddedArrayLine,
    /// Single unnumbered line of comma-separated items
    CommaList,
    /// One item per line, markers stripped
    BulletLines,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::DirectJson => "direct_json",
            StrategyKind::BalancedArray => "balanced_array",
            StrategyKind::BalancedObject => "balanced_object",
            StrategyKind::NumberedList => "numbered_list",
            StrategyKind::LabelLines => "label_lines",
            StrategyKind::EmbeddedArrayLine => "embedded_array_line",
            StrategyKind::CommaList => "comma_list",
            StrategyKind::BulletLines => "bullet_lines",
        }
    }
}

/// A parse strategy.
pub type Strategy = fn(&str) -> Option<ParsedValue>;

/// Strategies in precedence order. First success wins.
pub const STRATEGIES: &[(StrategyKind, Strategy)] = &[
    (StrategyKind::DirectJson, direct_json),
    (StrategyKind::BalancedArray, balanced_array),
    (StrategyKind::BalancedObject, balanced_object),
    (StrategyKind::NumberedList, numbered_list),
    (StrategyKind::LabelLines, label_lines),
    (StrategyKind::EmbeddedArrayLine, embedded_array_line),
    (StrategyKind::CommaList, comma_list),
    (StrategyKind::BulletLines, bullet_lines),
];

/// Upper bound on words per item for the comma-list split.
const MAX_COMMA_ITEM_WORDS: usize = 5;

lazy_static! {
    /// `1. `, `2) `, `(3) ` at line start or after a separator.
    static ref ORDINAL_MARKER: Regex = Regex::new(
        r"(?:^|[,;]?\s+)\(?\d{1,3}[.)]\s+"
    ).unwrap();

    /// `Label: cat`, `- Label 2: dog`, `label = bird`
    static ref LABEL_LINE: Regex = Regex::new(
        r"(?i)^\s*(?:[-*•+]\s*)?(?:\d{1,3}[.)]\s*)?label(?:\s*#?\d+)?\s*[:=]\s*(.+?)\s*$"
    ).unwrap();

    /// Leading bullet, numbering or heading marker.
    static ref BULLET_PREFIX: Regex = Regex::new(
        r"^\s*(?:[-*•+‣◦]\s+|\(?\d{1,3}[.)]\s*|#{1,6}\s+)"
    ).unwrap();

    /// Lines made only of brackets, braces and separators.
    static ref STRUCTURAL_NOISE: Regex = Regex::new(
        r"^[\[\]{}(),;:`\s]*$"
    ).unwrap();
}

pub fn direct_json(text: &str) -> Option<ParsedValue> {
    decode(text)
}

pub fn balanced_array(text: &str) -> Option<ParsedValue> {
    first_balanced(text, '[', ']').and_then(decode)
}

pub fn balanced_object(text: &str) -> Option<ParsedValue> {
    first_balanced(text, '{', '}').and_then(decode)
}

/// `1. Mercury, 2. Venus, 3. Earth` on a single line.
///
/// Requires two or more ordinal markers. Text before the first marker is
/// treated as a lead-in and dropped.
pub fn numbered_list(text: &str) -> Option<ParsedValue> {
    let line = single_line(text)?;
    let markers: Vec<_> = ORDINAL_MARKER.find_iter(line).collect();
    if markers.len() < 2 {
        return None;
    }

    let mut items = Vec::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map(|m| m.start()).unwrap_or(line.len());
        let item = strip_list_noise(&line[marker.end()..end]).trim_end_matches('.').trim();
        if !item.is_empty() {
            items.push(item.to_string());
        }
    }

    (!items.is_empty()).then_some(ParsedValue::LineList(items))
}

/// Every non-empty line is `Label: ...`.
pub fn label_lines(text: &str) -> Option<ParsedValue> {
    let lines = non_empty_lines(text);
    if lines.is_empty() {
        return None;
    }

    let mut labels = Vec::with_capacity(lines.len());
    for line in lines {
        let caps = LABEL_LINE.captures(line)?;
        let label = strip_list_noise(caps.get(1)?.as_str());
        if !label.is_empty() {
            labels.push(label.to_string());
        }
    }

    Some(ParsedValue::LineList(labels))
}

/// A decodable JSON array literal somewhere inside one line.
pub fn embedded_array_line(text: &str) -> Option<ParsedValue> {
    non_empty_lines(text).into_iter().find_map(|line| {
        balanced_candidates(line, '[', ']')
            .filter_map(decode)
            .find(|v| matches!(v, ParsedValue::JsonArray(_)))
    })
}

/// `Cat, Dog, Bird` on a single line with no ordinal markers.
pub fn comma_list(text: &str) -> Option<ParsedValue> {
    let line = single_line(text)?;
    if line.trim_end().ends_with(':') || ORDINAL_MARKER.find_iter(line).count() >= 2 {
        return None;
    }

    let items: Vec<String> = line
        .split(',')
        .map(clean_item)
        .filter(|s| !s.is_empty())
        .collect();

    let short = items
        .iter()
        .all(|item| item.split_whitespace().count() <= MAX_COMMA_ITEM_WORDS);

    (items.len() >= 2 && short).then_some(ParsedValue::LineList(items))
}

/// One item per line. Always succeeds.
pub fn bullet_lines(text: &str) -> Option<ParsedValue> {
    Some(ParsedValue::LineList(split_lines(text)))
}

/// Split text into cleaned list items, dropping structural noise and
/// lead-in lines ending in `:`.
pub fn split_lines(text: &str) -> Vec<String> {
    non_empty_lines(text)
        .into_iter()
        .filter(|line| !STRUCTURAL_NOISE.is_match(line) && !line.trim_end().ends_with(':'))
        .map(clean_item)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Strip bullet/numbering markers, wrapping quotes and trailing commas.
pub fn clean_item(raw: &str) -> String {
    let without_marker = BULLET_PREFIX.replace(raw, "");
    strip_list_noise(&without_marker).to_string()
}

fn non_empty_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.trim().is_empty()).collect()
}

fn single_line(text: &str) -> Option<&str> {
    let lines = non_empty_lines(text);
    match lines.as_slice() {
        [line] => Some(line.trim()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lines(items: &[&str]) -> Option<ParsedValue> {
        Some(ParsedValue::LineList(items.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn test_numbered_list() {
        assert_eq!(
            numbered_list("1. Mercury, 2. Venus, 3. Earth"),
            lines(&["Mercury", "Venus", "Earth"])
        );
        assert_eq!(numbered_list("1) Cat 2) Dog"), lines(&["Cat", "Dog"]));
        assert_eq!(
            numbered_list("Here you go: 1. Red apple, 2. Green apple."),
            lines(&["Red apple", "Green apple"])
        );
    }

    #[test]
    fn test_numbered_list_needs_two_markers_on_one_line() {
        assert_eq!(numbered_list("1. Mercury"), None);
        assert_eq!(numbered_list("1. Mercury\n2. Venus"), None);
        assert_eq!(numbered_list("Mercury, Venus"), None);
    }

    #[test]
    fn test_label_lines() {
        assert_eq!(
            label_lines("Label: cat\nLabel 2: dog\n- label: \"bird\""),
            lines(&["cat", "dog", "bird"])
        );
        assert_eq!(label_lines("Label: cat\nSomething else"), None);
    }

    #[test]
    fn test_embedded_array_line() {
        let text = "Options [see below]\nResult: [\"cat\", \"dog\"] done";
        assert_eq!(
            embedded_array_line(text),
            Some(ParsedValue::JsonArray(vec![json!("cat"), json!("dog")]))
        );
        assert_eq!(embedded_array_line("no arrays here"), None);
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(comma_list("Cat, Dog, Bird"), lines(&["Cat", "Dog", "Bird"]));
        assert_eq!(comma_list("'Cat', 'Dog'"), lines(&["Cat", "Dog"]));
        assert_eq!(comma_list("Cat"), None);
        assert_eq!(comma_list("Cat,\nDog"), None);
        assert_eq!(
            comma_list("This is a long sentence with many words in it, and another clause"),
            None
        );
    }

    #[test]
    fn test_bullet_lines_strip_markers() {
        let text = "Here are the labels:\n- cat\n* dog\n3. bird\n• fish\n[\n\"rabbit\",\n]";
        assert_eq!(
            bullet_lines(text),
            lines(&["cat", "dog", "bird", "fish", "rabbit"])
        );
    }

    #[test]
    fn test_bullet_lines_always_succeeds() {
        assert_eq!(bullet_lines(""), lines(&[]));
        assert_eq!(bullet_lines("not valid json at all"), lines(&["not valid json at all"]));
    }

    #[test]
    fn test_balanced_strategies() {
        assert_eq!(
            balanced_array("Sure! [\"a\"] hope that helps"),
            Some(ParsedValue::JsonArray(vec![json!("a")]))
        );
        assert_eq!(balanced_array("[not json]"), None);
        assert!(matches!(
            balanced_object("prefix {\"label\": \"a\"} suffix"),
            Some(ParsedValue::JsonObject(_))
        ));
    }

    #[test]
    fn test_strategy_names_are_unique() {
        let mut names: Vec<_> = STRATEGIES.iter().map(|(k, _)| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), STRATEGIES.len());
    }
}
