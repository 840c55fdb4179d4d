//! # stimulus-core
//!
//! Deterministic building blocks for LLM-backed stimulus synthesis.
//!
//! This crate turns a program request into a prompt, and whatever text a
//! model sends back into a well-formed stimulus set:
//! - **prompts**: system and user prompt per program type
//! - **parser**: ordered repair strategies over raw completions
//! - **normalizer**: program-specific shaping, including VPMTS quota-fill
//!
//! ## Key Guarantees
//!
//! 1. **No I/O**: Nothing here calls a model or touches the network
//! 2. **Total**: Parsing and normalization never fail
//! 3. **Exact VPMTS grids**: `numberOfCategories` groups of `numberOfExemplars` keys
//!
//! ## Example
//!
//! ```rust
//! use stimulus_core::{repair, ProgramType, RequestFields, StimulusSet};
//!
//! let fields = RequestFields::new().with("numTrials", 3);
//! let set = repair(ProgramType::Tacting, "1. Mercury, 2. Venus, 3. Earth", &fields);
//!
//! let StimulusSet::Labels(labels) = set else { panic!("label program") };
//! assert_eq!(labels[0].label, "Mercury");
//! ```

pub mod fields;
pub mod normalizer;
pub mod parser;
pub mod prompts;
pub mod text;
pub mod types;

pub use fields::RequestFields;
pub use normalizer::normalize;
pub use parser::{parse, parse_traced, ParsedValue, Shape, StrategyKind};
pub use prompts::Prompt;
pub use text::normalize_label;
pub use types::{
    HistoryKey, IntraverbalPair, LabelStimulus, MatchingType, ProgramType, StimulusSet,
    SynthesisRequest, TypeParseError, VpmtsGroup,
};

/// Parse a raw completion and normalize it for `program`.
pub fn repair(program: ProgramType, raw: &str, fields: &RequestFields) -> StimulusSet {
    let parsed = parse(raw);
    normalize(program, &parsed, fields, raw)
}
