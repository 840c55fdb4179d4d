//! Intraverbal prompt/answer pairs.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{field_text, unescape_fragment};
use crate::fields::RequestFields;
use crate::parser::{split_lines, ParsedValue, Shape};
use crate::text::{normalize_label, same_label, strip_list_noise};
use crate::types::IntraverbalPair;

const PROMPT_KEYS: &[&str] = &["prompt", "question", "q"];
const ANSWER_KEYS: &[&str] = &["answer", "response", "a"];

/// Separators for `prompt -> answer` strings, tried in order.
const PAIR_SEPARATORS: &[&str] = &["->", "=>", "→", "|", " - "];

lazy_static! {
    static ref PAIR_FRAGMENT: Regex = Regex::new(
        r#""(?:prompt|question|q)"\s*:\s*"((?:[^"\\]|\\.)*)"\s*,\s*"(?:answer|response|a)"\s*:\s*"((?:[^"\\]|\\.)*)""#
    ).unwrap();

    static ref QUESTION_LINE: Regex = Regex::new(
        r"(?i)^\s*(?:q(?:uestion)?|prompt)\s*[:.]\s*(.+?)\s*$"
    ).unwrap();

    static ref ANSWER_LINE: Regex = Regex::new(
        r"(?i)^\s*(?:a(?:nswer)?|response)\s*[:.]\s*(.+?)\s*$"
    ).unwrap();
}

pub(crate) fn normalize(
    parsed: &ParsedValue,
    fields: &RequestFields,
    raw: &str,
) -> Vec<IntraverbalPair> {
    let shape = parsed.shape();

    let structured: Vec<(String, String)> = match &shape {
        Shape::ObjectArray(objects) => objects
            .iter()
            .filter_map(|o| {
                match (field_text(o, PROMPT_KEYS), field_text(o, ANSWER_KEYS)) {
                    (None, None) => field_text(o, &["label"]).and_then(|s| split_pair(&s)),
                    (p, a) => Some((p.unwrap_or_default(), a.unwrap_or_default())),
                }
            })
            .collect(),
        Shape::StringArray(items) => items.iter().filter_map(|s| split_pair(s)).collect(),
        Shape::Scalar(Value::Object(o)) => {
            match (field_text(o, PROMPT_KEYS), field_text(o, ANSWER_KEYS)) {
                (Some(p), Some(a)) => vec![(p, a)],
                _ => Vec::new(),
            }
        }
        Shape::Scalar(_) | Shape::Unparseable(_) => Vec::new(),
    };

    let candidates = if !structured.is_empty() {
        structured
    } else {
        let fragments = pair_fragments(raw);
        if !fragments.is_empty() {
            debug!(count = fragments.len(), "Recovered intraverbal fragments");
            fragments
        } else {
            match shape {
                Shape::Unparseable(lines) => line_pairs(&lines),
                Shape::Scalar(Value::String(s)) => line_pairs(&split_lines(&s)),
                _ => Vec::new(),
            }
        }
    };

    finish(candidates, fields.num_trials())
}

fn pair_fragments(raw: &str) -> Vec<(String, String)> {
    PAIR_FRAGMENT
        .captures_iter(raw)
        .filter_map(|caps| Some((caps.get(1)?, caps.get(2)?)))
        .map(|(p, a)| (unescape_fragment(p.as_str()), unescape_fragment(a.as_str())))
        .collect()
}

/// `What says moo? -> Cow`
fn split_pair(text: &str) -> Option<(String, String)> {
    PAIR_SEPARATORS.iter().find_map(|sep| {
        let (prompt, answer) = text.split_once(sep)?;
        let prompt = strip_list_noise(prompt);
        let answer = strip_list_noise(answer);
        (!prompt.is_empty() && !answer.is_empty())
            .then(|| (prompt.to_string(), answer.to_string()))
    })
}

/// `Q:`/`A:` line pairs, or else one `prompt -> answer` per line.
fn line_pairs(lines: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut pending: Option<String> = None;

    for line in lines {
        if let Some(caps) = QUESTION_LINE.captures(line) {
            pending = caps.get(1).map(|m| m.as_str().to_string());
        } else if let Some(caps) = ANSWER_LINE.captures(line) {
            if let (Some(prompt), Some(answer)) = (pending.take(), caps.get(1)) {
                pairs.push((prompt, answer.as_str().to_string()));
            }
        }
    }

    if pairs.is_empty() {
        pairs = lines.iter().filter_map(|l| split_pair(l)).collect();
    }
    pairs
}

/// Drop pairs with an empty side and repeated prompts; cap at `limit`.
fn finish(candidates: Vec<(String, String)>, limit: usize) -> Vec<IntraverbalPair> {
    let produced = candidates.len();
    let mut pairs: Vec<IntraverbalPair> = Vec::with_capacity(limit.min(produced));

    for (prompt, answer) in candidates {
        if pairs.len() == limit {
            break;
        }
        let prompt = normalize_label(&prompt);
        let answer = normalize_label(&answer);
        if prompt.is_empty()
            || answer.is_empty()
            || pairs.iter().any(|p| same_label(&p.prompt, &prompt))
        {
            continue;
        }
        pairs.push(IntraverbalPair { prompt, answer });
    }

    if produced > pairs.len() {
        debug!(produced, kept = pairs.len(), limit, "Dropped incomplete or surplus pairs");
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(raw: &str, trials: usize) -> Vec<(String, String)> {
        let fields = RequestFields::new().with("numTrials", trials);
        normalize(&parse(raw), &fields, raw)
            .into_iter()
            .map(|p| (p.prompt, p.answer))
            .collect()
    }

    fn pair(p: &str, a: &str) -> (String, String) {
        (p.to_string(), a.to_string())
    }

    #[test]
    fn test_object_pairs_with_aliases() {
        let raw = r#"[
            {"prompt": "a cow says", "answer": "moo"},
            {"q": "Opposite of hot", "a": "cold"},
            {"Question": "Color of grass", "Response": "green"}
        ]"#;
        assert_eq!(
            run(raw, 12),
            vec![
                pair("A cow says", "Moo"),
                pair("Opposite of hot", "Cold"),
                pair("Color of grass", "Green"),
            ]
        );
    }

    #[test]
    fn test_incomplete_pairs_are_dropped() {
        let raw = r#"[{"prompt":"What is red?","answer":"Apple"},{"prompt":"","answer":"Sky"},{"prompt":"Lonely"}]"#;
        assert_eq!(run(raw, 12), vec![pair("What is red?", "Apple")]);
    }

    #[test]
    fn test_arrow_strings() {
        let raw = r#"["Ready, set -> go", "Twinkle twinkle => little star", "No separator"]"#;
        assert_eq!(
            run(raw, 12),
            vec![pair("Ready, set", "Go"), pair("Twinkle twinkle", "Little star")]
        );
    }

    #[test]
    fn test_qa_lines() {
        let raw = "Q: What do you sleep in?\nA: A bed\nQ: What do you drink?\nA: Water";
        assert_eq!(
            run(raw, 12),
            vec![pair("What do you sleep in?", "A bed"), pair("What do you drink?", "Water")]
        );
    }

    #[test]
    fn test_truncated_output_uses_fragments() {
        let raw = r#"[{"prompt":"Peanut butter and","answer":"jelly"},{"prompt":"Salt and","answ"#;
        assert_eq!(run(raw, 12), vec![pair("Peanut butter and", "Jelly")]);
    }

    #[test]
    fn test_truncated_to_trials() {
        let raw = r#"[{"q":"1","a":"x"},{"q":"2","a":"y"},{"q":"3","a":"z"}]"#;
        assert_eq!(run(raw, 2).len(), 2);
    }
}
