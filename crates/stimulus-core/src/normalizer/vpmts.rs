//! VPMTS grouped categories with deterministic quota-fill.
//!
//! Whatever the model returned, the result always has exactly
//! `numberOfCategories` groups of exactly `numberOfExemplars` keys:
//!
//! 1. A bare string array names the categories; keys are `{category}-{i}`.
//! 2. Otherwise `(category, key)` entries are accepted in order while the
//!    category and per-category quotas have room.
//! 3. Short categories are filled from the variation tables, then with
//!    `{category} item {n}`.
//! 4. Missing categories come from the matching type's fallback list, then
//!    `Category {n}`.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::labels::LABEL_KEYS;
use super::tables::{fallback_categories, lookup, MEMBER_TABLE, VARIANT_TABLE};
use super::{field_text, field_value, unescape_fragment, value_text};
use crate::fields::RequestFields;
use crate::parser::{split_lines, ParsedValue, Shape};
use crate::text::{normalize_label, same_label};
use crate::types::{MatchingType, VpmtsGroup};

const CATEGORY_KEYS: &[&str] = &["category", "group", "class", "categoryName", "category_name"];
const KEY_KEYS: &[&str] = &["key", "item", "label", "exemplar", "value"];
const KEY_LIST_KEYS: &[&str] = &["keys", "items", "exemplars", "members", "examples"];
/// Group names used only when the object also carries a key list.
const GROUP_NAME_KEYS: &[&str] = &["name", "title", "label"];

lazy_static! {
    static ref PAIR_FRAGMENT: Regex = Regex::new(
        r#""(?:category|group|class)"\s*:\s*"((?:[^"\\]|\\.)*)"\s*,\s*"(?:key|item|label|exemplar)"\s*:\s*"((?:[^"\\]|\\.)*)""#
    ).unwrap();

    /// `Animals: dog, cat`
    static ref CATEGORY_LINE: Regex = Regex::new(
        r"^\s*([^:]+?)\s*:\s*(.+?)\s*$"
    ).unwrap();
}

/// A category, optionally with one key for it.
type Entry = (String, Option<String>);

pub(crate) fn normalize(parsed: &ParsedValue, fields: &RequestFields, raw: &str) -> Vec<VpmtsGroup> {
    let mut quota = QuotaFill::new(
        fields.number_of_categories(),
        fields.number_of_exemplars(),
        fields.matching_type(),
    );

    // `{"category": .., "items": [..]}` is one group, not wrapped category names.
    let entries = match (parsed, parsed.shape()) {
        (ParsedValue::JsonObject(map), _) if field_text(map, CATEGORY_KEYS).is_some() => {
            object_entries(map)
        }
        (_, Shape::StringArray(items))
            if items.is_empty() || !items.iter().all(|s| s.contains(':')) =>
        {
            quota.name_categories(&items);
            return quota.finish();
        }
        (_, Shape::StringArray(lines) | Shape::Unparseable(lines)) => line_entries(&lines),
        (_, Shape::ObjectArray(objects)) => objects.iter().flat_map(object_entries).collect(),
        (_, Shape::Scalar(value)) => scalar_entries(&value),
    };

    quota.accept_all(prefer_fragments(parsed, entries, raw));
    quota.finish()
}

/// Raw `"category": .., "key": ..` fragments stand in for the parsed entries
/// only when those came from line heuristics, are empty, or cover fewer
/// pairs than the raw text holds (a truncated array decoded one object).
fn prefer_fragments(parsed: &ParsedValue, entries: Vec<Entry>, raw: &str) -> Vec<Entry> {
    let fragments = pair_fragments(raw);
    let heuristic = matches!(parsed, ParsedValue::LineList(_)) || entries.is_empty();
    if !fragments.is_empty() && (heuristic || fragments.len() > entries.len()) {
        debug!(count = fragments.len(), "Recovered VPMTS fragments");
        fragments
    } else {
        entries
    }
}

/// The grid under construction.
struct QuotaFill {
    categories: usize,
    exemplars: usize,
    matching: MatchingType,
    groups: Vec<VpmtsGroup>,
}

impl QuotaFill {
    fn new(categories: usize, exemplars: usize, matching: MatchingType) -> Self {
        Self {
            categories,
            exemplars,
            matching,
            groups: Vec::with_capacity(categories),
        }
    }

    /// Category names only; keys are numbered placeholders.
    fn name_categories(&mut self, names: &[String]) {
        for name in names {
            let category = normalize_label(name);
            if category.is_empty() || self.position(&category).is_some() {
                continue;
            }
            if self.groups.len() == self.categories {
                break;
            }
            let keys = (1..=self.exemplars).map(|i| format!("{category}-{i}")).collect();
            self.groups.push(VpmtsGroup { category, keys });
        }
    }

    fn accept_all(&mut self, entries: Vec<Entry>) {
        for (category, key) in entries {
            self.accept(&category, key.as_deref());
        }
    }

    /// Accept an entry while the category and key quotas have room.
    fn accept(&mut self, category: &str, key: Option<&str>) {
        let category = normalize_label(category);
        if category.is_empty() {
            return;
        }

        let index = match self.position(&category) {
            Some(index) => index,
            None if self.groups.len() < self.categories => {
                self.groups.push(VpmtsGroup {
                    category,
                    keys: Vec::with_capacity(self.exemplars),
                });
                self.groups.len() - 1
            }
            None => return,
        };

        let Some(key) = key.map(normalize_label).filter(|k| !k.is_empty()) else {
            return;
        };

        let dedup = self.matching != MatchingType::Identical;
        let group = &mut self.groups[index];
        if group.keys.len() < self.exemplars
            && !(dedup && group.keys.iter().any(|k| same_label(k, &key)))
        {
            group.keys.push(key);
        }
    }

    fn position(&self, category: &str) -> Option<usize> {
        self.groups.iter().position(|g| same_label(&g.category, category))
    }

    /// Fill short groups, add missing categories, and enforce the grid.
    fn finish(mut self) -> Vec<VpmtsGroup> {
        let mut filled_keys = 0;
        for group in &mut self.groups {
            filled_keys += fill_keys(group, self.exemplars, self.matching);
        }

        let mut synthetic = 0;
        let mut fallback = fallback_categories(self.matching).iter();
        let mut counter = 0;
        while self.groups.len() < self.categories {
            let category = match fallback.next() {
                Some(name) => name.to_string(),
                None => {
                    counter += 1;
                    format!("Category {counter}")
                }
            };
            if self.position(&category).is_some() {
                continue;
            }
            let mut group = VpmtsGroup {
                category,
                keys: Vec::with_capacity(self.exemplars),
            };
            fill_keys(&mut group, self.exemplars, self.matching);
            self.groups.push(group);
            synthetic += 1;
        }

        if filled_keys > 0 || synthetic > 0 {
            debug!(
                filled_keys,
                synthetic_categories = synthetic,
                matching = %self.matching,
                "Quota-filled VPMTS groups"
            );
        }

        self.groups.truncate(self.categories);
        for group in &mut self.groups {
            group.keys.truncate(self.exemplars);
        }

        debug_assert_eq!(self.groups.len(), self.categories);
        debug_assert!(self.groups.iter().all(|g| g.keys.len() == self.exemplars));
        self.groups
    }
}

/// Top up `group` to `exemplars` keys. Returns how many were added.
fn fill_keys(group: &mut VpmtsGroup, exemplars: usize, matching: MatchingType) -> usize {
    let before = group.keys.len();
    if before >= exemplars {
        return 0;
    }

    if matching == MatchingType::Identical {
        let key = group
            .keys
            .first()
            .cloned()
            .unwrap_or_else(|| identical_key(&group.category));
        group.keys.resize(exemplars, key);
        return exemplars - before;
    }

    let tables = match matching {
        MatchingType::NonIdentical => [VARIANT_TABLE, MEMBER_TABLE],
        _ => [MEMBER_TABLE, VARIANT_TABLE],
    };
    let candidates: Vec<&str> = tables
        .into_iter()
        .filter_map(|table| lookup(table, &group.category))
        .flat_map(|entry| entry.candidates.iter().copied())
        .collect();

    for candidate in candidates {
        if group.keys.len() == exemplars {
            break;
        }
        if !group.keys.iter().any(|k| same_label(k, candidate)) {
            group.keys.push(candidate.to_string());
        }
    }

    let mut n = 0;
    while group.keys.len() < exemplars {
        n += 1;
        let filler = format!("{} item {n}", group.category);
        if !group.keys.iter().any(|k| same_label(k, &filler)) {
            group.keys.push(filler);
        }
    }

    group.keys.len() - before
}

/// The one concrete key an Identical category repeats.
fn identical_key(category: &str) -> String {
    lookup(MEMBER_TABLE, category)
        .and_then(|entry| entry.candidates.first().copied())
        .or_else(|| lookup(VARIANT_TABLE, category).map(|entry| entry.base))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{category} item 1"))
}

/// Entries from one element of an object array.
fn object_entries(object: &Map<String, Value>) -> Vec<Entry> {
    let key_list = field_value(object, KEY_LIST_KEYS).and_then(Value::as_array);

    let category = field_text(object, CATEGORY_KEYS).or_else(|| {
        key_list.and_then(|_| field_text(object, GROUP_NAME_KEYS))
    });

    match (category, key_list) {
        (Some(category), Some(keys)) => group_entries(&category, keys),
        (Some(category), None) => {
            vec![(category, field_text(object, KEY_KEYS))]
        }
        // A lifted bare string such as "Animals: dog, cat".
        (None, _) => field_text(object, &["label"])
            .map(|line| line_entries(&[line]))
            .unwrap_or_default(),
    }
}

/// One entry per key. A group with no usable keys still registers its category.
fn group_entries(category: &str, keys: &[Value]) -> Vec<Entry> {
    let entries: Vec<Entry> = keys
        .iter()
        .filter_map(|key| match key {
            Value::Object(o) => field_text(o, LABEL_KEYS).or_else(|| field_text(o, KEY_KEYS)),
            other => value_text(other),
        })
        .map(|key| (category.to_string(), Some(key)))
        .collect();

    if entries.is_empty() {
        vec![(category.to_string(), None)]
    } else {
        entries
    }
}

/// A single group object or a `category -> keys` map.
fn scalar_entries(value: &Value) -> Vec<Entry> {
    match value {
        Value::Object(map) if field_text(map, CATEGORY_KEYS).is_some() => object_entries(map),
        Value::Object(map) => map
            .iter()
            .flat_map(|(category, keys)| match keys {
                Value::Array(keys) => group_entries(category, keys),
                Value::String(keys) => split_keys(category, keys),
                _ => Vec::new(),
            })
            .collect(),
        Value::String(s) => line_entries(&split_lines(s)),
        _ => Vec::new(),
    }
}

/// `Category: a, b` lines; lines without a colon are ignored.
fn line_entries(lines: &[String]) -> Vec<Entry> {
    lines
        .iter()
        .filter_map(|line| CATEGORY_LINE.captures(line))
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .flat_map(|(category, keys)| split_keys(category, keys))
        .collect()
}

fn split_keys(category: &str, keys: &str) -> Vec<Entry> {
    let entries: Vec<Entry> = keys
        .split([',', ';'])
        .map(|k| k.trim().trim_end_matches('.'))
        .filter(|k| !k.is_empty())
        .map(|k| (category.to_string(), Some(k.to_string())))
        .collect();

    if entries.is_empty() {
        vec![(category.to_string(), None)]
    } else {
        entries
    }
}

fn pair_fragments(raw: &str) -> Vec<Entry> {
    PAIR_FRAGMENT
        .captures_iter(raw)
        .filter_map(|caps| Some((caps.get(1)?, caps.get(2)?)))
        .map(|(c, k)| (unescape_fragment(c.as_str()), Some(unescape_fragment(k.as_str()))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(raw: &str, categories: usize, exemplars: usize, matching: &str) -> Vec<VpmtsGroup> {
        let fields = RequestFields::new()
            .with("numberOfCategories", categories)
            .with("numberOfExemplars", exemplars)
            .with("matchingType", matching);
        normalize(&parse(raw), &fields, raw)
    }

    fn group(category: &str, keys: &[&str]) -> VpmtsGroup {
        VpmtsGroup {
            category: category.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn assert_grid(groups: &[VpmtsGroup], categories: usize, exemplars: usize) {
        assert_eq!(groups.len(), categories);
        for g in groups {
            assert_eq!(g.keys.len(), exemplars, "{g:?}");
        }
    }

    #[test]
    fn test_pairs_fill_exactly() {
        let raw = r#"[
            {"category":"fruit","key":"apple"},
            {"category":"fruit","key":"banana"},
            {"category":"tools","key":"hammer"},
            {"category":"tools","key":"saw"}
        ]"#;
        assert_eq!(
            run(raw, 2, 2, "Class"),
            vec![group("Fruit", &["Apple", "Banana"]), group("Tools", &["Hammer", "Saw"])]
        );
    }

    #[test]
    fn test_surplus_is_dropped_in_order() {
        let raw = r#"[
            {"category":"fruit","key":"apple"},
            {"category":"fruit","key":"banana"},
            {"category":"fruit","key":"pear"},
            {"category":"tools","key":"hammer"},
            {"category":"toys","key":"ball"}
        ]"#;
        let groups = run(raw, 1, 2, "Class");
        assert_eq!(groups, vec![group("Fruit", &["Apple", "Banana"])]);
    }

    #[test]
    fn test_short_category_filled_from_members() {
        let raw = r#"[{"category":"Farm Animals","key":"pig"}]"#;
        let groups = run(raw, 1, 3, "Class");
        assert_eq!(groups, vec![group("Farm Animals", &["Pig", "Dog", "Cat"])]);
    }

    #[test]
    fn test_non_identical_uses_variants() {
        let groups = run(r#"[{"category":"Dogs","key":"poodle"}]"#, 1, 3, "Non-Identical");
        assert_eq!(groups, vec![group("Dogs", &["Poodle", "Golden retriever", "Beagle"])]);
    }

    #[test]
    fn test_identical_repeats_one_key() {
        let groups = run(r#"[{"category":"Cars","key":"car"}]"#, 2, 3, "Identical");
        assert_eq!(groups[0], group("Cars", &["Car", "Car", "Car"]));
        assert_eq!(groups[1], group("Animals", &["Dog", "Dog", "Dog"]));
    }

    #[test]
    fn test_duplicate_keys_only_under_identical() {
        let raw = r#"[{"category":"Cups","key":"mug"},{"category":"Cups","key":"Mug"}]"#;
        assert_eq!(run(raw, 1, 2, "Identical"), vec![group("Cups", &["Mug", "Mug"])]);
        assert_eq!(
            run(raw, 1, 2, "Non-Identical"),
            vec![group("Cups", &["Mug", "Coffee mug"])]
        );
    }

    #[test]
    fn test_string_array_names_categories() {
        let groups = run(r#"["planets", "oceans", "planets", "rivers"]"#, 2, 2, "Class");
        assert_eq!(
            groups,
            vec![
                group("Planets", &["Planets-1", "Planets-2"]),
                group("Oceans", &["Oceans-1", "Oceans-2"]),
            ]
        );
    }

    #[test]
    fn test_group_objects_and_maps() {
        let raw = r#"[{"name":"Fruits","items":["apple","pear"]},{"category":"Toys","keys":[{"label":"kite"}]}]"#;
        assert_eq!(
            run(raw, 2, 2, "Class"),
            vec![group("Fruits", &["Apple", "Pear"]), group("Toys", &["Kite", "Ball"])]
        );

        let map = r#"{"Shapes": ["circle", "square"], "Colors": "red, blue"}"#;
        assert_eq!(
            run(map, 2, 2, "Class"),
            vec![group("Shapes", &["Circle", "Square"]), group("Colors", &["Red", "Blue"])]
        );
    }

    #[test]
    fn test_single_group_object() {
        let raw = r#"{"category": "Fruits", "items": ["apple", "pear"]}"#;
        assert_eq!(run(raw, 1, 2, "Class"), vec![group("Fruits", &["Apple", "Pear"])]);
    }

    #[test]
    fn test_category_lines() {
        let raw = "Animals: dog, cat\nVehicles: car; bus";
        assert_eq!(
            run(raw, 2, 2, "Class"),
            vec![group("Animals", &["Dog", "Cat"]), group("Vehicles", &["Car", "Bus"])]
        );
    }

    #[test]
    fn test_garbage_is_all_synthetic() {
        let groups = run("not valid json at all", 2, 2, "Class");
        assert_eq!(
            groups,
            vec![group("Mammals", &["Dog", "Cat"]), group("Reptiles", &["Snake", "Lizard"])]
        );
    }

    #[test]
    fn test_fallback_skips_used_names_and_runs_out() {
        let groups = run(r#"[{"category":"Mammals","key":"whale"}]"#, 12, 1, "Class");
        assert_grid(&groups, 12, 1);
        assert_eq!(groups[0].category, "Mammals");
        assert_eq!(groups[1].category, "Reptiles");
        assert_eq!(groups[10].category, "Category 1");
        assert_eq!(groups[11].category, "Category 2");
        assert_eq!(groups[10].keys, vec!["Category 1 item 1"]);
    }

    #[test]
    fn test_generic_filler_after_tables_run_out() {
        let groups = run(r#"[{"category":"cups","key":"mug"}]"#, 1, 9, "Non-Identical");
        assert_grid(&groups, 1, 9);
        assert_eq!(groups[0].keys[8], "Cups item 2");
    }

    #[test]
    fn test_truncated_output_uses_fragments() {
        let raw = r#"[{"category":"Fruit","key":"apple"},{"category":"Fruit","key":"kiwi"},{"category":"To"#;
        let groups = run(raw, 1, 2, "Class");
        assert_eq!(groups, vec![group("Fruit", &["Apple", "Kiwi"])]);
    }

    #[test]
    fn test_wrapped_pairs_keep_any_key_order() {
        let raw = r#"{"groups":[{"category":"Fruit","key":"kiwi"},{"key":"plum","category":"Fruit"}]}"#;
        assert_eq!(run(raw, 1, 2, "Class"), vec![group("Fruit", &["Kiwi", "Plum"])]);
    }

    #[test]
    fn test_decoded_pairs_win_over_fragments() {
        let raw = r#"[{"key":"dog","category":"Pets"},{"category":"Pets","key":"cat"}]"#;
        assert_eq!(run(raw, 1, 2, "Class"), vec![group("Pets", &["Dog", "Cat"])]);
    }
}
