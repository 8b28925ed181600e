//! Canonical categories and validated raw-label maps
//!
//! Raw CSV labels never travel past ingestion: each categorical column is
//! resolved through a [`LabelMap`] into a closed enum, and every numeric
//! recoding (sentiment score, difficulty rank, helpfulness indicator) is an
//! exhaustive `match` on that enum.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A closed set of labels with a fixed canonical order
pub trait Category: Copy + Ord + fmt::Debug + 'static {
    /// Every variant, in canonical (reporting) order
    const ALL: &'static [Self];

    /// Display label used in reports
    fn label(self) -> &'static str;
}

/// Experimental condition (between-subjects factor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// No assistance
    #[serde(rename = "None")]
    Unassisted,
    /// AI-generated answers
    #[serde(rename = "LLM Answer")]
    LlmAnswer,
    /// AI guidance
    #[serde(rename = "LLM Guidance")]
    LlmGuidance,
}

impl Category for Condition {
    const ALL: &'static [Self] = &[Self::Unassisted, Self::LlmAnswer, Self::LlmGuidance];

    fn label(self) -> &'static str {
        match self {
            Self::Unassisted => "None",
            Self::LlmAnswer => "LLM Answer",
            Self::LlmGuidance => "LLM Guidance",
        }
    }
}

/// Task phase a response was collected in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Exposure,
    Test,
}

impl Category for Phase {
    const ALL: &'static [Self] = &[Self::Exposure, Self::Test];

    fn label(self) -> &'static str {
        match self {
            Self::Exposure => "Exposure",
            Self::Test => "Test",
        }
    }
}

/// Three-level attitude towards AI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiSentiment {
    Negative,
    Neutral,
    Positive,
}

impl AiSentiment {
    pub fn score(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
        }
    }
}

impl Category for AiSentiment {
    const ALL: &'static [Self] = &[Self::Negative, Self::Neutral, Self::Positive];

    fn label(self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
        }
    }
}

/// Perceived task difficulty, ordered from easiest to hardest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Neutral,
    Difficult,
    VeryDifficult,
}

impl Difficulty {
    /// 1-based rank in the ordered label list
    pub fn rank(self) -> u8 {
        match self {
            Self::VeryEasy => 1,
            Self::Easy => 2,
            Self::Neutral => 3,
            Self::Difficult => 4,
            Self::VeryDifficult => 5,
        }
    }
}

impl Category for Difficulty {
    const ALL: &'static [Self] = &[
        Self::VeryEasy,
        Self::Easy,
        Self::Neutral,
        Self::Difficult,
        Self::VeryDifficult,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::VeryEasy => "Very easy",
            Self::Easy => "Easy",
            Self::Neutral => "Neither easy nor difficult",
            Self::Difficult => "Difficult",
            Self::VeryDifficult => "Very difficult",
        }
    }
}

/// Perceived helpfulness of the assistance received
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Helpfulness {
    VeryUnhelpful,
    ALittleUnhelpful,
    Neutral,
    ALittleHelpful,
    VeryHelpful,
}

impl Category for Helpfulness {
    const ALL: &'static [Self] = &[
        Self::VeryUnhelpful,
        Self::ALittleUnhelpful,
        Self::Neutral,
        Self::ALittleHelpful,
        Self::VeryHelpful,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::VeryUnhelpful => "Very unhelpful",
            Self::ALittleUnhelpful => "A little unhelpful",
            Self::Neutral => "Neither helpful nor unhelpful",
            Self::ALittleHelpful => "A little helpful",
            Self::VeryHelpful => "Very helpful",
        }
    }
}

/// Raw label → category lookup table
///
/// A valid map is a bijection between its raw labels and `T::ALL`; call
/// [`LabelMap::validate`] once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap<T> {
    entries: BTreeMap<String, T>,
}

impl<T: Category> LabelMap<T> {
    pub fn new<S: Into<String>>(pairs: impl IntoIterator<Item = (S, T)>) -> Self {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Map where each variant's raw label is its display label
    pub fn identity() -> Self {
        Self::new(T::ALL.iter().map(|v| (v.label(), *v)))
    }

    /// Resolve a raw label; anything outside the map is a [`AnalysisError::Mapping`]
    pub fn resolve(&self, column: &str, raw: &str) -> Result<T> {
        self.entries
            .get(raw.trim())
            .copied()
            .ok_or_else(|| AnalysisError::mapping(column, raw))
    }

    /// Raw label that maps onto `value`
    pub fn raw_label(&self, value: T) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the map is a bijection onto `T::ALL`
    pub fn validate(&self, name: &str) -> Result<()> {
        for variant in T::ALL {
            let hits = self.entries.values().filter(|v| *v == variant).count();
            if hits != 1 {
                return Err(AnalysisError::Config(format!(
                    "label map '{}' must map exactly one raw label to {:?}, found {}",
                    name, variant, hits
                )));
            }
        }
        if self.entries.len() != T::ALL.len() {
            return Err(AnalysisError::Config(format!(
                "label map '{}' has {} entries, expected {}",
                name,
                self.entries.len(),
                T::ALL.len()
            )));
        }
        if self.entries.keys().any(|k| k.trim().is_empty()) {
            return Err(AnalysisError::Config(format!(
                "label map '{}' contains a blank raw label",
                name
            )));
        }
        // resolve() trims its input, so a padded key could never match
        if let Some(key) = self.entries.keys().find(|k| k.trim() != k.as_str()) {
            return Err(AnalysisError::Config(format!(
                "label map '{}' raw label '{}' has surrounding whitespace",
                name, key
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
