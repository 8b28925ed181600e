// Configuration for the experiment analysis
//
// Every constant the pipeline depends on (label maps, attention-check pass
// value, post-hoc family-wise alpha, analysed phase) lives here so that a TOML
// file can override it without touching code.

use crate::error::{AnalysisError, Result};
use crate::labels::{AiSentiment, Condition, Difficulty, Helpfulness, LabelMap, Phase};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw label maps for every categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub condition: LabelMap<Condition>,
    pub phase: LabelMap<Phase>,
    pub ai_sentiment: LabelMap<AiSentiment>,
    pub difficulty: LabelMap<Difficulty>,
    pub helpfulness: LabelMap<Helpfulness>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            condition: LabelMap::new([
                ("absent", Condition::Unassisted),
                ("generate", Condition::LlmAnswer),
                ("coach", Condition::LlmGuidance),
            ]),
            phase: LabelMap::new([("practice", Phase::Exposure), ("test", Phase::Test)]),
            ai_sentiment: LabelMap::identity(),
            difficulty: LabelMap::identity(),
            helpfulness: LabelMap::identity(),
        }
    }
}

impl LabelConfig {
    pub fn validate(&self) -> Result<()> {
        self.condition.validate("condition")?;
        self.phase.validate("phase")?;
        self.ai_sentiment.validate("ai_sentiment")?;
        self.difficulty.validate("difficulty")?;
        self.helpfulness.validate("helpfulness")?;
        Ok(())
    }
}

/// Column names of the participant table
///
/// `workerid` is also the join key looked up in the response and fluency
/// tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantColumns {
    pub workerid: String,
    pub condition: String,
    pub attention_check: String,
    pub pre_creative: String,
    pub post_creative: String,
    pub pre_ai_sentiment: String,
    pub post_ai_sentiment: String,
    pub difficulty: String,
    pub helpfulness: String,
}

impl Default for ParticipantColumns {
    fn default() -> Self {
        Self {
            workerid: "workerid".to_string(),
            condition: "condition".to_string(),
            attention_check: "attention_check".to_string(),
            pre_creative: "pre_creative".to_string(),
            post_creative: "post_creative".to_string(),
            pre_ai_sentiment: "pre_ai_sentiment".to_string(),
            post_ai_sentiment: "post_ai_sentiment".to_string(),
            difficulty: "difficulty".to_string(),
            helpfulness: "helpfulness".to_string(),
        }
    }
}

impl ParticipantColumns {
    pub fn all(&self) -> [&str; 9] {
        [
            self.workerid.as_str(),
            self.condition.as_str(),
            self.attention_check.as_str(),
            self.pre_creative.as_str(),
            self.post_creative.as_str(),
            self.pre_ai_sentiment.as_str(),
            self.post_ai_sentiment.as_str(),
            self.difficulty.as_str(),
            self.helpfulness.as_str(),
        ]
    }
}

/// Analysis configuration
///
/// # Example
/// ```
/// use convergent::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.attention_pass, "Agree");
/// assert_eq!(config.significance_level, 0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Value of the attention-check column that counts as a pass
    ///
    /// Exact, case-sensitive match after trimming. No partial credit.
    pub attention_pass: String,

    /// Family-wise error rate for the post-hoc comparisons
    pub significance_level: f64,

    /// Phase whose trials feed the covariate model
    pub analysis_phase: Phase,

    /// Helpfulness levels that count as "helpful"
    pub helpful_levels: Vec<Helpfulness>,

    /// Helpfulness value meaning the question was not shown; scores 0
    pub helpful_not_asked: String,

    pub columns: ParticipantColumns,

    pub labels: LabelConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            attention_pass: "Agree".to_string(),
            significance_level: 0.05,
            analysis_phase: Phase::Test,
            helpful_levels: vec![Helpfulness::ALittleHelpful, Helpfulness::VeryHelpful],
            helpful_not_asked: String::new(),
            columns: ParticipantColumns::default(),
            labels: LabelConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a TOML file; absent keys keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(AnalysisError::Config(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }

        if self.attention_pass.trim().is_empty() {
            return Err(AnalysisError::Config(
                "attention_pass must not be blank".to_string(),
            ));
        }

        if self.helpful_levels.is_empty() {
            return Err(AnalysisError::Config(
                "helpful_levels must name at least one level".to_string(),
            ));
        }

        self.labels.validate()?;

        if self
            .labels
            .helpfulness
            .resolve("helpfulness", &self.helpful_not_asked)
            .is_ok()
        {
            return Err(AnalysisError::Config(format!(
                "helpful_not_asked '{}' is also a helpfulness label",
                self.helpful_not_asked
            )));
        }
        Ok(())
    }
}
