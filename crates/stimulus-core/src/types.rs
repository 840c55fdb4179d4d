//! Core types for stimulus synthesis.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::fields::RequestFields;
use crate::text::slugify;

/// Error returned when a program or matching type string is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeParseError {
    #[error("Unknown program type: '{0}'")]
    UnknownProgramType(String),

    #[error("Unknown matching type: '{0}'")]
    UnknownMatchingType(String),
}

/// The teaching program a stimulus set is generated for.
///
/// Selects both the prompt template and the normalizer variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramType {
    /// Naming pictured items
    Tacting,
    /// Answering spoken prompts (fill-ins, questions)
    Intraverbal,
    /// Selecting the named item from an array
    ListenerResponding,
    /// Visual-position matching-to-sample (grouped category data)
    #[serde(rename = "vpmts")]
    Vpmts,
    /// Putting items in order
    Seriation,
    /// Sorting items into groups
    Sorting,
}

impl ProgramType {
    /// All program types, in declaration order.
    pub const ALL: [ProgramType; 6] = [
        ProgramType::Tacting,
        ProgramType::Intraverbal,
        ProgramType::ListenerResponding,
        ProgramType::Vpmts,
        ProgramType::Seriation,
        ProgramType::Sorting,
    ];

    /// Stable slug used in history keys.
    pub fn slug(&self) -> &'static str {
        match self {
            ProgramType::Tacting => "tacting",
            ProgramType::Intraverbal => "intraverbal",
            ProgramType::ListenerResponding => "listener-responding",
            ProgramType::Vpmts => "vpmts",
            ProgramType::Seriation => "seriation",
            ProgramType::Sorting => "sorting",
        }
    }

    /// Programs whose stimuli are a flat list of labels.
    pub fn is_label_only(&self) -> bool {
        matches!(
            self,
            ProgramType::Tacting
                | ProgramType::ListenerResponding
                | ProgramType::Seriation
                | ProgramType::Sorting
        )
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgramType::Tacting => "Tacting",
            ProgramType::Intraverbal => "Intraverbal",
            ProgramType::ListenerResponding => "Listener Responding",
            ProgramType::Vpmts => "VPMTS",
            ProgramType::Seriation => "Seriation",
            ProgramType::Sorting => "Sorting",
        };
        f.write_str(name)
    }
}

impl FromStr for ProgramType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "tacting" | "tact" | "tacts" => Ok(ProgramType::Tacting),
            "intraverbal" | "intraverbals" => Ok(ProgramType::Intraverbal),
            "listenerresponding" | "listener" | "listenerresponse" | "receptive" => {
                Ok(ProgramType::ListenerResponding)
            }
            "vpmts" | "matchingtosample" | "visualpositionmatchingtosample" => {
                Ok(ProgramType::Vpmts)
            }
            "seriation" | "sequencing" => Ok(ProgramType::Seriation),
            "sorting" | "sort" => Ok(ProgramType::Sorting),
            _ => Err(TypeParseError::UnknownProgramType(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ProgramType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// VPMTS sub-mode controlling how keys within one category relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchingType {
    /// One concrete key repeated within the category
    #[default]
    Identical,
    /// Named variations of one specific object type
    NonIdentical,
    /// Varied members of one broad class
    Class,
}

impl fmt::Display for MatchingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchingType::Identical => "Identical",
            MatchingType::NonIdentical => "Non-Identical",
            MatchingType::Class => "Class",
        };
        f.write_str(name)
    }
}

impl FromStr for MatchingType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "identical" | "same" => Ok(MatchingType::Identical),
            "nonidentical" | "notidentical" | "variation" | "variations" => {
                Ok(MatchingType::NonIdentical)
            }
            "class" | "classes" | "category" | "categorical" => Ok(MatchingType::Class),
            _ => Err(TypeParseError::UnknownMatchingType(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for MatchingType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lower-case and drop everything that is not alphanumeric.
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A request to synthesize stimuli for one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    /// Which program template and normalizer apply
    pub program_type: ProgramType,

    /// Caller-defined fields (title, counts, matching type, ...)
    #[serde(default)]
    pub fields: RequestFields,
}

impl SynthesisRequest {
    /// Create a request with the given fields.
    pub fn new(program_type: ProgramType, fields: RequestFields) -> Self {
        Self {
            program_type,
            fields,
        }
    }

    /// The history key this request reads and updates.
    pub fn history_key(&self) -> HistoryKey {
        HistoryKey::derive(self.program_type, &self.fields)
    }
}

/// Stable identifier grouping a program's prior stimuli.
///
/// Format: `<program-slug>:<title-or-description-slug>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryKey(String);

impl HistoryKey {
    /// Derive the key for a program and its fields.
    pub fn derive(program_type: ProgramType, fields: &RequestFields) -> Self {
        let subject = fields
            .title()
            .or_else(|| fields.description())
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "untitled".to_string());

        Self(format!("{}:{}", program_type.slug(), subject))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single label stimulus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStimulus {
    pub label: String,
}

/// An intraverbal prompt with its expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntraverbalPair {
    pub prompt: String,
    pub answer: String,
}

/// One VPMTS category with its keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpmtsGroup {
    pub category: String,
    pub keys: Vec<String>,
}

/// Program-specific structured stimuli.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum StimulusSet {
    /// Tacting, Listener Responding, Seriation, Sorting
    Labels(Vec<LabelStimulus>),
    /// Intraverbal
    Intraverbal(Vec<IntraverbalPair>),
    /// VPMTS
    Vpmts(Vec<VpmtsGroup>),
}

impl StimulusSet {
    /// Number of top-level entries (labels, pairs, or groups).
    pub fn len(&self) -> usize {
        match self {
            StimulusSet::Labels(items) => items.len(),
            StimulusSet::Intraverbal(pairs) => pairs.len(),
            StimulusSet::Vpmts(groups) => groups.len(),
        }
    }

    /// True when nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The literal strings a learner sees, in emission order.
    ///
    /// Labels for label sets, prompts for intraverbal sets, and every key
    /// of every group for VPMTS sets.
    pub fn emitted_labels(&self) -> Vec<String> {
        match self {
            StimulusSet::Labels(items) => items.iter().map(|i| i.label.clone()).collect(),
            StimulusSet::Intraverbal(pairs) => pairs.iter().map(|p| p.prompt.clone()).collect(),
            StimulusSet::Vpmts(groups) => groups
                .iter()
                .flat_map(|g| g.keys.iter().cloned())
                .collect(),
        }
    }
}
