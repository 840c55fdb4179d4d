//! Untyped request fields with typed, defaulting accessors.
//!
//! Callers send whatever their program editor collected. Each consumer
//! reads only the keys it understands; unknown keys are ignored and bad
//! values fall back to defaults rather than failing the request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::MatchingType;

/// Default trial count for label and intraverbal programs.
pub const DEFAULT_NUM_TRIALS: usize = 12;

/// Default VPMTS category count.
pub const DEFAULT_NUM_CATEGORIES: usize = 3;

/// Default VPMTS exemplars per category.
pub const DEFAULT_NUM_EXEMPLARS: usize = 2;

/// Upper bound on requested trials.
pub const MAX_NUM_TRIALS: usize = 100;

/// Upper bound on requested categories.
pub const MAX_NUM_CATEGORIES: usize = 20;

/// Upper bound on requested exemplars per category.
pub const MAX_NUM_EXEMPLARS: usize = 20;

const NUM_TRIALS_KEYS: &[&str] = &["numTrials", "num_trials", "trials"];
const NUM_CATEGORIES_KEYS: &[&str] = &["numberOfCategories", "number_of_categories", "numCategories"];
const NUM_EXEMPLARS_KEYS: &[&str] = &[
    "numberOfExemplars",
    "number_of_exemplars",
    "itemsPerCategory",
    "items_per_category",
];
const MATCHING_TYPE_KEYS: &[&str] = &["matchingType", "matching_type"];
const EXCLUDE_KEYS: &[&str] = &["excludeLabels", "exclude_labels", "exclusions"];

/// Request fields keyed by the caller's field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestFields(Map<String, Value>);

impl RequestFields {
    /// Empty field set; every accessor returns its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value. Non-object values give an empty set.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Set a field, returning the updated set.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set a field in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A trimmed, non-empty string field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    /// Optional teaching mode (e.g. "expressive", "pictures").
    pub fn mode(&self) -> Option<&str> {
        self.text("mode")
    }

    /// Trials for label and intraverbal programs.
    pub fn num_trials(&self) -> usize {
        self.count(NUM_TRIALS_KEYS, DEFAULT_NUM_TRIALS, MAX_NUM_TRIALS)
    }

    /// VPMTS category count.
    pub fn number_of_categories(&self) -> usize {
        self.count(NUM_CATEGORIES_KEYS, DEFAULT_NUM_CATEGORIES, MAX_NUM_CATEGORIES)
    }

    /// VPMTS keys per category.
    pub fn number_of_exemplars(&self) -> usize {
        self.count(NUM_EXEMPLARS_KEYS, DEFAULT_NUM_EXEMPLARS, MAX_NUM_EXEMPLARS)
    }

    /// VPMTS matching type; unrecognised values fall back to the default.
    pub fn matching_type(&self) -> MatchingType {
        self.first(MATCHING_TYPE_KEYS)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Caller-provided labels to avoid, in addition to history.
    pub fn excluded_labels(&self) -> Vec<String> {
        match self.first(EXCLUDE_KEYS) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn first(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.0.get(*k))
    }

    /// Positive count from a number or numeric string, clamped to `max`.
    fn count(&self, keys: &[&str], default: usize, max: usize) -> usize {
        let parsed = match self.first(keys) {
            Some(Value::Number(n)) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 1.0)
                    .map(|f| f.floor() as u64)
            }),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<u64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f >= 1.0)
                        .map(|f| f.floor() as u64)
                })
            }
            _ => None,
        };

        match parsed {
            Some(0) | None => default,
            Some(n) => (n.min(max as u64)) as usize,
        }
    }
}

impl From<Map<String, Value>> for RequestFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
