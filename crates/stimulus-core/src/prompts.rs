//! Prompt construction for stimulus synthesis.
//!
//! System prompts are assembled from static fragments so the shared part
//! stays byte-identical across requests:
//! 1. Base prompt (shared by every program)
//! 2. Program prompt (and matching-type prompt for VPMTS)
//! 3. Output contract (always last)
//!
//! The user prompt carries everything request-specific: title, counts and
//! the exclusion list fed back from history.

use std::fmt::Write as _;

use crate::fields::RequestFields;
use crate::types::{MatchingType, ProgramType};

/// Base system prompt shared across all programs.
pub const BASE_SYSTEM_PROMPT: &str = r#"
You design teaching stimuli for applied behavior analysis (ABA) therapy sessions.

Your stimuli are shown to learners, often young children, one trial at a time.

## Stimulus Constraints
1. Every stimulus must be concrete, age-appropriate and easy to picture
2. Use common everyday words; avoid brand names, slang and proper nouns unless asked
3. Every stimulus in one response must be distinct
4. Keep each stimulus short: one to four words
5. Stay on the topic given by the program title and description
"#;

/// Tacting: the learner names what is shown.
pub const TACTING_PROMPT: &str = r#"
## Program: Tacting
The learner sees a picture and names it.
Produce labels for items that can be photographed or illustrated unambiguously.

Each element has the shape: {"label": "string"}
"#;

/// Listener responding: the learner selects the named item.
pub const LISTENER_RESPONDING_PROMPT: &str = r#"
## Program: Listener Responding
The learner hears a label and selects the matching picture from an array.
Produce labels for items that look clearly different from one another so
they can be presented side by side.

Each element has the shape: {"label": "string"}
"#;

/// Seriation: the learner orders items.
pub const SERIATION_PROMPT: &str = r#"
## Program: Seriation
The learner puts items in order (size, sequence of steps, time of day, life cycle).
Produce labels already in the correct order, first to last.

Each element has the shape: {"label": "string"}
"#;

/// Sorting: the learner groups items.
pub const SORTING_PROMPT: &str = r#"
## Program: Sorting
The learner sorts items into groups by a shared feature.
Produce labels for items that each clearly belong to one obvious group.

Each element has the shape: {"label": "string"}
"#;

/// Intraverbal: the learner answers a spoken prompt.
pub const INTRAVERBAL_PROMPT: &str = r#"
## Program: Intraverbal
The learner hears a prompt (a question or fill-in) and answers verbally, without pictures.
Each prompt must have one short, unambiguous answer.

Each element has the shape: {"prompt": "string", "answer": "string"}
"#;

/// VPMTS shared instructions.
pub const VPMTS_PROMPT: &str = r#"
## Program: Visual-Position Matching-to-Sample (VPMTS)
The learner matches a sample picture to the picture of the same category.
Produce category/key pairs: the category names the group, the key names one picture in it.

Each element has the shape: {"category": "string", "key": "string"}
List all keys of one category before moving to the next category.
"#;

/// VPMTS identical matching.
pub const VPMTS_IDENTICAL_PROMPT: &str = r#"
## Matching Type: Identical
Each category uses ONE concrete object, repeated as its key for every entry
(the learner matches identical pictures). Example: category "Animals", key "Dog" for
every entry of that category.
"#;

/// VPMTS non-identical matching.
pub const VPMTS_NON_IDENTICAL_PROMPT: &str = r#"
## Matching Type: Non-Identical
Each category is ONE specific type of object, and every key is a different
specific variation of it. Example: category "Dogs", keys "Golden retriever",
"Poodle", "Dalmatian".
"#;

/// VPMTS class matching.
pub const VPMTS_CLASS_PROMPT: &str = r#"
## Matching Type: Class
Each category is a BROAD class, and every key is a different member of that class.
Example: category "Mammals", keys "Dog", "Horse", "Elephant".
"#;

/// Output contract appended to every structured system prompt.
pub const OUTPUT_CONTRACT: &str = r#"
## Output Contract
Return ONLY a raw JSON array.
No prose, no explanations, no Markdown code fences, and no string-wrapped array.
"#;

/// System prompt for the plain-text teaching instructions path.
pub const TEACHING_INSTRUCTIONS_PROMPT: &str = r#"
You write teaching instructions for ABA therapists running a structured program.

Write clear, numbered, step-by-step instructions covering:
1. Materials and setup
2. How to present a trial (the SD)
3. Prompting and prompt fading
4. Reinforcement
5. Error correction
6. Data collection and mastery criteria

Write plain text. Do not return JSON.
"#;

/// A system/user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Single-string form for clients that take one prompt.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system.trim_end(), self.user.trim_start())
    }
}

/// The program-specific system prompt fragment.
pub fn program_prompt(program: ProgramType) -> &'static str {
    match program {
        ProgramType::Tacting => TACTING_PROMPT,
        ProgramType::Intraverbal => INTRAVERBAL_PROMPT,
        ProgramType::ListenerResponding => LISTENER_RESPONDING_PROMPT,
        ProgramType::Vpmts => VPMTS_PROMPT,
        ProgramType::Seriation => SERIATION_PROMPT,
        ProgramType::Sorting => SORTING_PROMPT,
    }
}

/// The VPMTS matching-type fragment.
pub fn matching_prompt(matching: MatchingType) -> &'static str {
    match matching {
        MatchingType::Identical => VPMTS_IDENTICAL_PROMPT,
        MatchingType::NonIdentical => VPMTS_NON_IDENTICAL_PROMPT,
        MatchingType::Class => VPMTS_CLASS_PROMPT,
    }
}

/// Total number of entries the completion is asked for.
pub fn required_total(program: ProgramType, fields: &RequestFields) -> usize {
    match program {
        ProgramType::Vpmts => fields.number_of_categories() * fields.number_of_exemplars(),
        _ => fields.num_trials(),
    }
}

/// Build the prompt pair for a synthesis request.
///
/// `exclusions` are listed verbatim in the user prompt.
pub fn build(program: ProgramType, fields: &RequestFields, exclusions: &[String]) -> Prompt {
    let mut system = String::new();
    system.push_str(BASE_SYSTEM_PROMPT);
    system.push_str(program_prompt(program));
    if program == ProgramType::Vpmts {
        system.push_str(matching_prompt(fields.matching_type()));
    }
    system.push_str(OUTPUT_CONTRACT);

    let mut user = subject_section(program, fields);
    let total = required_total(program, fields);

    match program {
        ProgramType::Vpmts => {
            let categories = fields.number_of_categories();
            let exemplars = fields.number_of_exemplars();
            let _ = writeln!(
                user,
                "Generate exactly {total} category/key pairs: exactly {categories} categories \
                 with exactly {exemplars} keys each."
            );
            let _ = writeln!(user, "Matching type: {}.", fields.matching_type());
        }
        ProgramType::Intraverbal => {
            let _ = writeln!(user, "Generate exactly {total} distinct prompt/answer pairs.");
        }
        _ => {
            let _ = writeln!(user, "Generate exactly {total} distinct labels.");
        }
    }

    if !exclusions.is_empty() {
        user.push_str(
            "\nDo NOT reuse any of these previously used stimuli. They are listed exactly \
             as they were shown:\n",
        );
        for label in exclusions {
            let _ = writeln!(user, "- {label}");
        }
        user.push_str(
            "Every new stimulus must be different from everything above and from each other.\n",
        );
    }

    Prompt { system, user }
}

/// Build the prompt for plain-text teaching instructions.
pub fn teaching_instructions(program: ProgramType, fields: &RequestFields) -> Prompt {
    let mut user = subject_section(program, fields);
    match program {
        ProgramType::Vpmts => {
            let _ = writeln!(
                user,
                "Matching type: {}. Categories: {}. Exemplars per category: {}.",
                fields.matching_type(),
                fields.number_of_categories(),
                fields.number_of_exemplars()
            );
        }
        _ => {
            let _ = writeln!(user, "Trials per session: {}.", fields.num_trials());
        }
    }
    user.push_str("Write the teaching instructions for this program.\n");

    Prompt {
        system: TEACHING_INSTRUCTIONS_PROMPT.to_string(),
        user,
    }
}

fn subject_section(program: ProgramType, fields: &RequestFields) -> String {
    let mut section = String::new();
    let _ = writeln!(section, "Program type: {program}");
    if let Some(title) = fields.title() {
        let _ = writeln!(section, "Title: {title}");
    }
    if let Some(description) = fields.description() {
        let _ = writeln!(section, "Description: {description}");
    }
    if let Some(mode) = fields.mode() {
        let _ = writeln!(section, "Mode: {mode}");
    }
    section.push('\n');
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> RequestFields {
        RequestFields::from_json(value)
    }

    #[test]
    fn test_every_system_prompt_ends_with_output_contract() {
        for program in ProgramType::ALL {
            let prompt = build(program, &RequestFields::new(), &[]);
            assert!(
                prompt.system.ends_with(OUTPUT_CONTRACT),
                "{program} prompt does not end with the output contract"
            );
            assert!(prompt.system.starts_with(BASE_SYSTEM_PROMPT));
        }
    }

    #[test]
    fn test_required_total() {
        assert_eq!(required_total(ProgramType::Tacting, &RequestFields::new()), 12);
        assert_eq!(required_total(ProgramType::Vpmts, &RequestFields::new()), 6);
        let f = fields(json!({"numberOfCategories": 4, "numberOfExemplars": 3, "numTrials": 2}));
        assert_eq!(required_total(ProgramType::Vpmts, &f), 12);
        assert_eq!(required_total(ProgramType::Intraverbal, &f), 2);
    }

    #[test]
    fn test_simple_program_counts_in_user_prompt() {
        let prompt = build(ProgramType::Tacting, &fields(json!({"numTrials": 5})), &[]);
        assert!(prompt.user.contains("exactly 5 distinct labels"));
        assert!(prompt.system.contains("Program: Tacting"));
    }

    #[test]
    fn test_vpmts_matching_types_are_distinct() {
        let identical = build(ProgramType::Vpmts, &fields(json!({"matchingType": "Identical"})), &[]);
        let non_identical =
            build(ProgramType::Vpmts, &fields(json!({"matchingType": "Non-Identical"})), &[]);
        let class = build(ProgramType::Vpmts, &fields(json!({"matchingType": "Class"})), &[]);

        assert!(identical.system.contains("Matching Type: Identical"));
        assert!(non_identical.system.contains("Matching Type: Non-Identical"));
        assert!(class.system.contains("Matching Type: Class"));
        assert_ne!(identical.system, non_identical.system);
        assert_ne!(non_identical.system, class.system);
        assert!(class.user.contains("exactly 3 categories with exactly 2 keys each"));
    }

    #[test]
    fn test_exclusions_listed_verbatim() {
        let exclusions = vec!["Cat".to_string(), "Golden retriever".to_string(), "Ice \"cream\"".to_string()];
        let prompt = build(ProgramType::Tacting, &RequestFields::new(), &exclusions);
        for label in &exclusions {
            assert!(prompt.user.contains(label.as_str()));
        }
        assert!(prompt.user.contains("Do NOT reuse"));
    }

    #[test]
    fn test_no_exclusion_section_when_empty() {
        let prompt = build(ProgramType::Sorting, &RequestFields::new(), &[]);
        assert!(!prompt.user.contains("Do NOT reuse"));
    }

    #[test]
    fn test_subject_section() {
        let prompt = build(
            ProgramType::Intraverbal,
            &fields(json!({"title": "Animal sounds", "description": "What does it say?", "mode": "verbal"})),
            &[],
        );
        assert!(prompt.user.contains("Title: Animal sounds"));
        assert!(prompt.user.contains("Description: What does it say?"));
        assert!(prompt.user.contains("Mode: verbal"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let f = fields(json!({"title": "Fruit", "numTrials": 4}));
        let ex = vec!["Apple".to_string()];
        assert_eq!(build(ProgramType::Tacting, &f, &ex), build(ProgramType::Tacting, &f, &ex));
    }

    #[test]
    fn test_teaching_instructions_prompt() {
        let prompt = teaching_instructions(ProgramType::Vpmts, &fields(json!({"title": "Shapes"})));
        assert!(prompt.system.contains("Do not return JSON"));
        assert!(prompt.user.contains("Title: Shapes"));
        assert!(prompt.user.contains("Matching type: Identical"));
    }

    #[test]
    fn test_combined_prompt() {
        let prompt = build(ProgramType::Tacting, &RequestFields::new(), &[]);
        let combined = prompt.combined();
        assert!(combined.contains("Output Contract"));
        assert!(combined.contains("Generate exactly 12 distinct labels"));
    }
}
