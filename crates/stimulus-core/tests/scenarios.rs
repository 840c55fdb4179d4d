//! End-to-end repair of realistic completions.

use stimulus_core::prompts;
use stimulus_core::{
    parse_traced, repair, IntraverbalPair, MatchingType, ProgramType, RequestFields,
    StimulusSet, StrategyKind,
};

fn labels(set: StimulusSet) -> Vec<String> {
    match set {
        StimulusSet::Labels(items) => items.into_iter().map(|s| s.label).collect(),
        other => panic!("expected labels, got {other:?}"),
    }
}

#[test]
fn test_label_objects_are_capitalized() {
    let set = repair(
        ProgramType::Tacting,
        r#"[{"label":"cat"}, {"label":"dog"}]"#,
        &RequestFields::new(),
    );
    assert_eq!(labels(set), vec!["Cat", "Dog"]);
}

#[test]
fn test_numbered_line_becomes_three_labels() {
    let fields = RequestFields::new().with("numTrials", 3);
    let set = repair(ProgramType::Tacting, "1. Mercury, 2. Venus, 3. Earth", &fields);
    assert_eq!(labels(set), vec!["Mercury", "Venus", "Earth"]);
}

#[test]
fn test_garbage_vpmts_is_fully_synthetic() {
    let fields = RequestFields::new()
        .with("numberOfCategories", 2)
        .with("numberOfExemplars", 2)
        .with("matchingType", "Class");

    let StimulusSet::Vpmts(groups) = repair(ProgramType::Vpmts, "not valid json at all", &fields)
    else {
        panic!("expected VPMTS groups");
    };

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].category, "Mammals");
    assert_eq!(groups[1].category, "Reptiles");
    assert!(groups.iter().all(|g| g.keys.len() == 2));
}

#[test]
fn test_intraverbal_drops_empty_prompt() {
    let raw = r#"[{"prompt":"Twinkle twinkle little","answer":"star"},{"prompt":"","answer":"moon"}]"#;
    let set = repair(ProgramType::Intraverbal, raw, &RequestFields::new());
    assert_eq!(
        set,
        StimulusSet::Intraverbal(vec![IntraverbalPair {
            prompt: "Twinkle twinkle little".into(),
            answer: "Star".into(),
        }])
    );
}

#[test]
fn test_fenced_and_double_encoded_completions() {
    let fenced = "```json\n[\"apple\", \"pear\"]\n```";
    assert_eq!(
        labels(repair(ProgramType::Sorting, fenced, &RequestFields::new())),
        vec!["Apple", "Pear"]
    );

    let double = r#""[{\"label\":\"apple\"},{\"label\":\"pear\"}]""#;
    assert_eq!(
        labels(repair(ProgramType::Seriation, double, &RequestFields::new())),
        vec!["Apple", "Pear"]
    );
}

#[test]
fn test_prose_wrapped_and_wrapper_object() {
    let prose = "Sure! Here are your stimuli:\n[\"ball\", \"cup\"]\nLet me know if you need more.";
    assert_eq!(
        labels(repair(ProgramType::ListenerResponding, prose, &RequestFields::new())),
        vec!["Ball", "Cup"]
    );

    let wrapped = r#"{"stimuli": [{"name": "ball"}, {"name": "cup"}]}"#;
    assert_eq!(
        labels(repair(ProgramType::ListenerResponding, wrapped, &RequestFields::new())),
        vec!["Ball", "Cup"]
    );
}

#[test]
fn test_trailing_fence_and_truncated_strings() {
    let trailing = "[\"cat\", \"dog\"]\n```";
    assert_eq!(
        labels(repair(ProgramType::Tacting, trailing, &RequestFields::new())),
        vec!["Cat", "Dog"]
    );

    let truncated = r#"["cat", "dog", "bi"#;
    assert_eq!(
        labels(repair(ProgramType::Tacting, truncated, &RequestFields::new())),
        vec!["Cat", "Dog"]
    );
}

#[test]
fn test_vpmts_wrapper_object_in_either_key_order() {
    let fields = RequestFields::new()
        .with("numberOfCategories", 1)
        .with("numberOfExemplars", 2)
        .with("matchingType", "Class");
    let raw = r#"{"groups":[{"category":"Fruit","key":"kiwi"},{"key":"plum","category":"Fruit"}]}"#;

    let StimulusSet::Vpmts(groups) = repair(ProgramType::Vpmts, raw, &fields) else {
        panic!("expected VPMTS groups");
    };
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].category, "Fruit");
    assert_eq!(groups[0].keys, vec!["Kiwi", "Plum"]);
}

#[test]
fn test_line_precedence() {
    let cases = [
        ("1. Red, 2. Blue", StrategyKind::NumberedList),
        ("Label: red\nLabel: blue", StrategyKind::LabelLines),
        ("Options [pick two]\n[\"red\", \"blue\"]", StrategyKind::EmbeddedArrayLine),
        ("red, blue", StrategyKind::CommaList),
        ("- red\n- blue", StrategyKind::BulletLines),
    ];

    for (raw, expected) in cases {
        let (_, kind) = parse_traced(raw);
        assert_eq!(kind, expected, "{raw:?}");
        assert_eq!(
            labels(repair(ProgramType::Tacting, raw, &RequestFields::new())),
            vec!["Red", "Blue"],
            "{raw:?}"
        );
    }
}

#[test]
fn test_prompt_lists_exclusions_and_totals() {
    let fields = RequestFields::new()
        .with("title", "Vehicles")
        .with("numberOfCategories", 3)
        .with("numberOfExemplars", 4)
        .with("matchingType", "non identical");
    assert_eq!(fields.matching_type(), MatchingType::NonIdentical);

    let prompt = prompts::build(ProgramType::Vpmts, &fields, &["Fire truck".to_string()]);
    assert!(prompt.user.contains("12"));
    assert!(prompt.user.contains("- Fire truck"));
    assert!(prompt.system.contains("Non-Identical"));
}
