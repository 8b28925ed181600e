//! Attention-check screening
//!
//! Participants whose attention-check answer is not exactly the configured
//! pass value are dropped, and the exclusion cascades to their responses.
//! Surviving responses must carry the same condition as their participant.

use crate::dataset::{Participant, Response};
use crate::error::{AnalysisError, Result};
use crate::labels::Category;
use std::collections::BTreeMap;

/// Participant and response tables after screening
#[derive(Debug, Clone, Default)]
pub struct FilteredData {
    pub participants: Vec<Participant>,
    pub responses: Vec<Response>,
    /// Worker ids that failed the attention check
    pub excluded: Vec<String>,
    /// Responses whose worker id matched no retained participant
    pub dropped_responses: usize,
}

/// Apply the attention check and cascade it to responses
///
/// Zero survivors is not an error; downstream stages report empty groups.
pub fn apply_attention_check(
    participants: &[Participant],
    responses: &[Response],
    pass_value: &str,
) -> Result<FilteredData> {
    let (kept, failed): (Vec<&Participant>, Vec<&Participant>) = participants
        .iter()
        .partition(|p| p.attention_check.trim() == pass_value);

    let retained: BTreeMap<&str, &Participant> =
        kept.iter().map(|p| (p.workerid.as_str(), *p)).collect();

    let mut kept_responses = Vec::with_capacity(responses.len());
    for response in responses {
        let Some(owner) = retained.get(response.workerid.as_str()) else {
            continue;
        };
        if owner.condition != response.condition {
            return Err(AnalysisError::ConditionMismatch {
                workerid: response.workerid.clone(),
                participant: owner.condition.label().to_string(),
                response: response.condition.label().to_string(),
            });
        }
        kept_responses.push(response.clone());
    }

    let dropped_responses = responses.len() - kept_responses.len();
    tracing::info!(
        retained = kept.len(),
        excluded = failed.len(),
        dropped_responses,
        "attention check applied"
    );

    Ok(FilteredData {
        participants: kept.into_iter().cloned().collect(),
        responses: kept_responses,
        excluded: failed.into_iter().map(|p| p.workerid.clone()).collect(),
        dropped_responses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{Condition, Phase};

    fn participant(id: &str, condition: Condition, attention: &str) -> Participant {
        Participant {
            workerid: id.to_string(),
            condition,
            attention_check: attention.to_string(),
            pre_creative: 3.0,
            post_creative: 3.0,
            pre_ai_sentiment: "Neutral".to_string(),
            post_ai_sentiment: "Neutral".to_string(),
            difficulty: "Easy".to_string(),
            helpfulness: String::new(),
        }
    }

    fn response(id: &str, condition: Condition) -> Response {
        Response {
            workerid: id.to_string(),
            phase: Phase::Test,
            condition,
            is_correct: true,
        }
    }

    #[test]
    fn test_failed_participants_are_removed_with_their_responses() {
        let ps = vec![
            participant("a", Condition::Unassisted, "Agree"),
            participant("b", Condition::LlmAnswer, "Disagree"),
            participant("c", Condition::LlmGuidance, "Agree"),
        ];
        let rs = vec![
            response("a", Condition::Unassisted),
            response("b", Condition::LlmAnswer),
            response("b", Condition::LlmAnswer),
            response("c", Condition::LlmGuidance),
            response("orphan", Condition::LlmGuidance),
        ];

        let filtered = apply_attention_check(&ps, &rs, "Agree").unwrap();
        assert_eq!(filtered.participants.len(), 2);
        assert_eq!(filtered.excluded, vec!["b".to_string()]);
        assert_eq!(filtered.responses.len(), 2);
        assert_eq!(filtered.dropped_responses, 3);
        assert!(filtered.responses.iter().all(|r| r.workerid != "b"));
    }

    #[test]
    fn test_pass_value_is_exact() {
        let ps = vec![
            participant("a", Condition::Unassisted, "agree"),
            participant("b", Condition::Unassisted, "Strongly Agree"),
        ];
        let filtered = apply_attention_check(&ps, &[], "Agree").unwrap();
        assert!(filtered.participants.is_empty());
        assert_eq!(filtered.excluded.len(), 2);
    }

    #[test]
    fn test_zero_survivors_is_not_an_error() {
        let ps = vec![participant("a", Condition::Unassisted, "No")];
        let rs = vec![response("a", Condition::Unassisted)];
        let filtered = apply_attention_check(&ps, &rs, "Agree").unwrap();
        assert!(filtered.participants.is_empty());
        assert!(filtered.responses.is_empty());
    }

    #[test]
    fn test_condition_disagreement_is_rejected() {
        let ps = vec![participant("a", Condition::Unassisted, "Agree")];
        let rs = vec![response("a", Condition::LlmGuidance)];
        let err = apply_attention_check(&ps, &rs, "Agree").unwrap_err();
        assert!(matches!(err, AnalysisError::ConditionMismatch { .. }));
    }

    #[test]
    fn test_mismatch_on_excluded_participant_is_ignored() {
        let ps = vec![participant("a", Condition::Unassisted, "Disagree")];
        let rs = vec![response("a", Condition::LlmGuidance)];
        assert!(apply_attention_check(&ps, &rs, "Agree").is_ok());
    }
}
