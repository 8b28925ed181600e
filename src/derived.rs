//! Per-participant derived scores
//!
//! Raw participant fields are never modified; derived values live in a
//! separate [`ParticipantMetrics`] record keyed by worker id.

use crate::aggregate::{summarize_levels, Observation, Summary};
use crate::config::AnalysisConfig;
use crate::dataset::Participant;
use crate::error::Result;
use crate::labels::{Category, Condition, Helpfulness};
use serde::Serialize;

/// Derived scores for one participant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantMetrics {
    pub workerid: String,
    pub condition: Condition,
    /// post - pre self-rated creativity
    pub creative_diff: f64,
    pub pre_ai_feel: i8,
    pub post_ai_feel: i8,
    /// post_ai_feel - pre_ai_feel
    pub feel_diff: i8,
    /// Rank of the difficulty label (1 = easiest)
    pub difficulty: u8,
    /// 1 when helpfulness is in the positive subset, else 0
    pub helpful: u8,
}

/// Helpfulness indicator
///
/// The configured "not asked" value scores 0; any other label outside the
/// helpfulness map is a mapping error.
pub fn helpful_indicator(raw: &str, config: &AnalysisConfig) -> Result<u8> {
    if raw.trim() == config.helpful_not_asked.trim() {
        return Ok(0);
    }
    let level: Helpfulness = config
        .labels
        .helpfulness
        .resolve(&config.columns.helpfulness, raw)?;
    Ok(u8::from(config.helpful_levels.contains(&level)))
}

/// Compute every derived score for one participant
pub fn derive_participant(p: &Participant, config: &AnalysisConfig) -> Result<ParticipantMetrics> {
    let labels = &config.labels;
    let cols = &config.columns;

    let pre_ai_feel = labels
        .ai_sentiment
        .resolve(&cols.pre_ai_sentiment, &p.pre_ai_sentiment)?
        .score();
    let post_ai_feel = labels
        .ai_sentiment
        .resolve(&cols.post_ai_sentiment, &p.post_ai_sentiment)?
        .score();
    let difficulty = labels
        .difficulty
        .resolve(&cols.difficulty, &p.difficulty)?
        .rank();

    Ok(ParticipantMetrics {
        workerid: p.workerid.clone(),
        condition: p.condition,
        creative_diff: p.post_creative - p.pre_creative,
        pre_ai_feel,
        post_ai_feel,
        feel_diff: post_ai_feel - pre_ai_feel,
        difficulty,
        helpful: helpful_indicator(&p.helpfulness, config)?,
    })
}

/// Derive scores for every participant, failing on the first unmapped label
pub fn derive_all(
    participants: &[Participant],
    config: &AnalysisConfig,
) -> Result<Vec<ParticipantMetrics>> {
    participants
        .iter()
        .map(|p| derive_participant(p, config))
        .collect()
}

/// Condition-level summaries of each derived score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSummaries {
    pub creative_diff: Summary<Condition>,
    pub feel_diff: Summary<Condition>,
    pub pre_ai_feel: Summary<Condition>,
    pub post_ai_feel: Summary<Condition>,
    pub difficulty: Summary<Condition>,
    pub helpful: Summary<Condition>,
}

pub fn summarize_by_condition(metrics: &[ParticipantMetrics]) -> DerivedSummaries {
    let by = |f: fn(&ParticipantMetrics) -> f64| {
        summarize_levels(
            metrics
                .iter()
                .map(|m| Observation::new(m.workerid.clone(), m.condition, f(m))),
            Condition::ALL,
        )
    };

    DerivedSummaries {
        creative_diff: by(|m| m.creative_diff),
        feel_diff: by(|m| f64::from(m.feel_diff)),
        pre_ai_feel: by(|m| f64::from(m.pre_ai_feel)),
        post_ai_feel: by(|m| f64::from(m.post_ai_feel)),
        difficulty: by(|m| f64::from(m.difficulty)),
        helpful: by(|m| f64::from(m.helpful)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    fn participant(pre: &str, post: &str, difficulty: &str, helpfulness: &str) -> Participant {
        Participant {
            workerid: "w".to_string(),
            condition: Condition::LlmAnswer,
            attention_check: "Agree".to_string(),
            pre_creative: 2.0,
            post_creative: 5.0,
            pre_ai_sentiment: pre.to_string(),
            post_ai_sentiment: post.to_string(),
            difficulty: difficulty.to_string(),
            helpfulness: helpfulness.to_string(),
        }
    }

    #[test]
    fn test_derive_participant() {
        let config = AnalysisConfig::default();
        let m = derive_participant(
            &participant("Negative", "Positive", "Difficult", "Very helpful"),
            &config,
        )
        .unwrap();
        assert_eq!(m.creative_diff, 3.0);
        assert_eq!(m.pre_ai_feel, -1);
        assert_eq!(m.post_ai_feel, 1);
        assert_eq!(m.feel_diff, 2);
        assert_eq!(m.difficulty, 4);
        assert_eq!(m.helpful, 1);
    }

    #[test]
    fn test_helpful_indicator_levels() {
        let config = AnalysisConfig::default();
        for label in ["A little helpful", "Very helpful"] {
            assert_eq!(helpful_indicator(label, &config).unwrap(), 1);
        }
        for label in [
            "Very unhelpful",
            "A little unhelpful",
            "Neither helpful nor unhelpful",
        ] {
            assert_eq!(helpful_indicator(label, &config).unwrap(), 0);
        }
        // not asked
        assert_eq!(helpful_indicator("", &config).unwrap(), 0);
        assert_eq!(helpful_indicator("  ", &config).unwrap(), 0);
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_blank_helpfulness_is_mapping_error_without_not_asked_value() {
        let mut config = AnalysisConfig::default();
        config.helpful_not_asked = "N/A".to_string();
        assert_eq!(helpful_indicator("N/A", &config).unwrap(), 0);
        let err = helpful_indicator("", &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Mapping { .. }));
    }

    #[test]
    fn test_helpful_indicator_unknown_label() {
        let err = helpful_indicator("Super helpful", &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Mapping { .. }));
    }

    #[test]
    fn test_unknown_sentiment_is_mapping_error() {
        let err = derive_participant(
            &participant("Meh", "Positive", "Easy", ""),
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        match err {
            AnalysisError::Mapping { column, value } => {
                assert_eq!(column, "pre_ai_sentiment");
                assert_eq!(value, "Meh");
            }
            other => panic!("Expected mapping error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_difficulty_is_mapping_error() {
        let err = derive_participant(
            &participant("Neutral", "Neutral", "Impossible", ""),
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Mapping { .. }));
    }

    #[test]
    fn test_raw_fields_untouched() {
        let p = participant("Negative", "Positive", "Difficult", "Very helpful");
        let before = p.clone();
        let _ = derive_participant(&p, &AnalysisConfig::default()).unwrap();
        assert_eq!(p, before);
    }

    #[test]
    fn test_not_asked_helpfulness_counts_as_zero() {
        let config = AnalysisConfig::default();
        let mut a = participant("Neutral", "Neutral", "Easy", "");
        a.workerid = "a".to_string();
        a.condition = Condition::Unassisted;
        let mut b = participant("Neutral", "Positive", "Easy", "Very helpful");
        b.workerid = "b".to_string();

        let metrics = derive_all(&[a, b], &config).unwrap();
        let summaries = summarize_by_condition(&metrics);

        let none = summaries.helpful.get(&Condition::Unassisted).unwrap();
        assert_eq!(none.n, 1);
        assert_eq!(none.mean, 0.0);
        assert_eq!(summaries.helpful.get(&Condition::LlmAnswer).unwrap().mean, 1.0);
        assert_eq!(summaries.feel_diff.get(&Condition::LlmAnswer).unwrap().mean, 1.0);
        assert_eq!(summaries.creative_diff.rows.len(), 3);
    }
}
