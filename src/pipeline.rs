//! Staged analysis pipeline
//!
//! Each stage is a function from immutable inputs to a fresh value; nothing is
//! mutated in place. Stages run in a fixed order:
//!
//! 1. parse raw tables (labels resolved, schema checked)
//! 2. attention-check screening
//! 3. randomization balance
//! 4. accuracy summaries by (phase, condition) and by condition
//! 5. derived participant metrics and their condition summaries
//! 6. verbal-fluency join
//! 7. covariate model on the analysis phase
//! 8. Tukey comparisons
//!
//! Ingestion failures (stages 1-2) abort the run. Failures in stages 5, 7 and
//! 8 are recorded as [`StageFailure`]s and the remaining stages still report.

use crate::aggregate::{summarize_levels, Observation, Summary};
use crate::config::AnalysisConfig;
use crate::dataset::{
    fluency_scores, join_fluency, FluencyEntry, Participant, RawTables, Response, ScoredResponse,
};
use crate::derived::{derive_all, summarize_by_condition, DerivedSummaries, ParticipantMetrics};
use crate::error::Result;
use crate::labels::{Category, Condition, Phase};
use crate::model::{
    fit_covariate_model, tukey_hsd, AnovaTable, CovariateModel, CovariateObservation, TukeyHsd,
};
use crate::quality::{apply_attention_check, FilteredData};
use crate::randomization::{check_balance, BalanceTest};
use serde::Serialize;

/// Covariate and factor names used in the model output
pub const COVARIATE: &str = "verbal_fluency";
pub const FACTOR: &str = "condition";

/// Stage that can fail without aborting the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DerivedMetrics,
    CovariateModel,
    PostHoc,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::DerivedMetrics => "derived metrics",
            Stage::CovariateModel => "covariate model",
            Stage::PostHoc => "post-hoc comparison",
        };
        write!(f, "{}", name)
    }
}

/// A stage-local failure, kept in the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Participant and response counts through screening
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningSummary {
    pub participants_total: usize,
    pub participants_retained: usize,
    pub responses_total: usize,
    pub responses_retained: usize,
    /// Worker ids that failed the attention check
    pub excluded: Vec<String>,
}

/// Everything the analysis produces, as plain structured records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub version: String,
    pub analysis_phase: Phase,
    pub significance_level: f64,
    pub screening: ScreeningSummary,
    pub balance: BalanceTest,
    /// Subject-level accuracy by (phase, condition)
    pub accuracy_by_phase: Summary<(Phase, Condition)>,
    /// Subject-level accuracy by condition, analysis phase only
    pub accuracy_by_condition: Summary<Condition>,
    pub fluency_by_condition: Summary<Condition>,
    pub derived: Option<DerivedSummaries>,
    pub anova: Option<AnovaTable>,
    pub posthoc: Option<TukeyHsd<Condition>>,
    pub stage_failures: Vec<StageFailure>,
}

impl AnalysisReport {
    /// True when every stage produced output
    pub fn is_complete(&self) -> bool {
        self.stage_failures.is_empty()
    }

    pub fn failure(&self, stage: Stage) -> Option<&StageFailure> {
        self.stage_failures.iter().find(|f| f.stage == stage)
    }
}

/// Full pipeline output: intermediate tables plus the report
#[derive(Debug, Clone)]
pub struct Analysis {
    pub filtered: FilteredData,
    pub scored_responses: Vec<ScoredResponse>,
    pub metrics: Vec<ParticipantMetrics>,
    pub model: Option<CovariateModel<Condition>>,
    pub report: AnalysisReport,
}

/// Run the whole pipeline and keep only the report
pub fn analyze(raw: &RawTables, config: &AnalysisConfig) -> Result<AnalysisReport> {
    run(raw, config).map(|analysis| analysis.report)
}

/// Run the whole pipeline
pub fn run(raw: &RawTables, config: &AnalysisConfig) -> Result<Analysis> {
    config.validate()?;

    let participants = Participant::parse_table(&raw.participants, config)?;
    let responses = Response::parse_table(&raw.responses, config)?;
    let fluency = FluencyEntry::parse_table(&raw.fluency, config)?;
    tracing::info!(
        participants = participants.len(),
        responses = responses.len(),
        fluency_entries = fluency.len(),
        "input tables parsed"
    );

    let filtered = apply_attention_check(&participants, &responses, &config.attention_pass)?;
    let screening = ScreeningSummary {
        participants_total: participants.len(),
        participants_retained: filtered.participants.len(),
        responses_total: responses.len(),
        responses_retained: filtered.responses.len(),
        excluded: filtered.excluded.clone(),
    };

    let balance = check_balance(filtered.participants.iter().map(|p| &p.condition));

    let accuracy_by_phase = accuracy_by_phase(&filtered.responses);
    let accuracy_by_condition = accuracy_by_condition(&filtered.responses, config.analysis_phase);

    let mut stage_failures = Vec::new();

    let (metrics, derived) = match derive_all(&filtered.participants, config) {
        Ok(metrics) => {
            let summaries = summarize_by_condition(&metrics);
            (metrics, Some(summaries))
        }
        Err(e) => {
            record(&mut stage_failures, Stage::DerivedMetrics, &e);
            (Vec::new(), None)
        }
    };

    let scores = fluency_scores(&filtered.participants, &fluency);
    let fluency_by_condition = summarize_levels(
        filtered.participants.iter().map(|p| {
            let score = scores.get(&p.workerid).copied().unwrap_or(0);
            Observation::new(p.workerid.clone(), p.condition, f64::from(score))
        }),
        Condition::ALL,
    );
    let scored_responses = join_fluency(&filtered.responses, &scores);

    let observations = model_observations(&scored_responses, config.analysis_phase);
    let model = match fit_covariate_model(&observations, COVARIATE, FACTOR) {
        Ok(model) => Some(model),
        Err(e) => {
            record(&mut stage_failures, Stage::CovariateModel, &e);
            None
        }
    };

    let posthoc = model
        .as_ref()
        .and_then(|m| match tukey_hsd(m, config.significance_level) {
            Ok(hsd) => Some(hsd),
            Err(e) => {
                record(&mut stage_failures, Stage::PostHoc, &e);
                None
            }
        });

    let report = AnalysisReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        analysis_phase: config.analysis_phase,
        significance_level: config.significance_level,
        screening,
        balance,
        accuracy_by_phase,
        accuracy_by_condition,
        fluency_by_condition,
        derived,
        anova: model.as_ref().map(|m| m.anova.clone()),
        posthoc,
        stage_failures,
    };

    tracing::info!(
        complete = report.is_complete(),
        failures = report.stage_failures.len(),
        "analysis finished"
    );

    Ok(Analysis {
        filtered,
        scored_responses,
        metrics,
        model,
        report,
    })
}

fn record(failures: &mut Vec<StageFailure>, stage: Stage, error: &dyn std::fmt::Display) {
    tracing::error!(%stage, "stage failed: {}", error);
    failures.push(StageFailure {
        stage,
        message: error.to_string(),
    });
}

/// Subject-level accuracy for every (phase, condition) cell
pub fn accuracy_by_phase(responses: &[Response]) -> Summary<(Phase, Condition)> {
    let cells: Vec<(Phase, Condition)> = Phase::ALL
        .iter()
        .flat_map(|phase| Condition::ALL.iter().map(move |c| (*phase, *c)))
        .collect();

    summarize_levels(
        responses.iter().map(|r| {
            Observation::new(
                r.workerid.clone(),
                (r.phase, r.condition),
                f64::from(u8::from(r.is_correct)),
            )
        }),
        &cells,
    )
}

/// Subject-level accuracy per condition within one phase
pub fn accuracy_by_condition(responses: &[Response], phase: Phase) -> Summary<Condition> {
    summarize_levels(
        responses.iter().filter(|r| r.phase == phase).map(|r| {
            Observation::new(
                r.workerid.clone(),
                r.condition,
                f64::from(u8::from(r.is_correct)),
            )
        }),
        Condition::ALL,
    )
}

/// Trial-level model rows for one phase
pub fn model_observations(
    responses: &[ScoredResponse],
    phase: Phase,
) -> Vec<CovariateObservation<Condition>> {
    responses
        .iter()
        .filter(|r| r.phase == phase)
        .map(|r| CovariateObservation {
            outcome: f64::from(u8::from(r.is_correct)),
            covariate: r.verbal_fluency,
            level: r.condition,
        })
        .collect()
}
