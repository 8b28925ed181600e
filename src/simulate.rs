//! Seeded synthetic experiment data
//!
//! Produces the three raw input tables with the configured raw labels, so the
//! output goes through exactly the same ingestion path as collected data.

use crate::config::AnalysisConfig;
use crate::dataset::{RawTables, Response, Table, FLUENCY, PARTICIPANTS, RESPONSES};
use crate::error::{AnalysisError, Result};
use crate::labels::{AiSentiment, Category, Condition, Difficulty, Helpfulness, LabelMap, Phase};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shape of a simulated study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Participants per condition
    pub per_condition: usize,

    /// Test-phase trials per participant
    pub test_trials: usize,

    /// Exposure-phase trials per participant
    pub practice_trials: usize,

    /// True test accuracy for None / LLM Answer / LLM Guidance
    pub accuracy: [f64; 3],

    /// Fluency words listed per participant, inclusive range
    pub fluency_range: (u32, u32),

    /// Probability that a participant fails the attention check
    pub attention_fail_rate: f64,

    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            per_condition: 30,
            test_trials: 10,
            practice_trials: 3,
            accuracy: [0.5, 0.6, 0.7],
            fluency_range: (5, 25),
            attention_fail_rate: 0.0,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(p) = self.accuracy.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(AnalysisError::Config(format!(
                "accuracy must be in [0, 1], got {}",
                p
            )));
        }
        if !(0.0..=1.0).contains(&self.attention_fail_rate) {
            return Err(AnalysisError::Config(format!(
                "attention_fail_rate must be in [0, 1], got {}",
                self.attention_fail_rate
            )));
        }
        if self.fluency_range.0 > self.fluency_range.1 {
            return Err(AnalysisError::Config(format!(
                "fluency_range is empty: {:?}",
                self.fluency_range
            )));
        }
        Ok(())
    }

    fn accuracy_for(&self, condition: Condition) -> f64 {
        match condition {
            Condition::Unassisted => self.accuracy[0],
            Condition::LlmAnswer => self.accuracy[1],
            Condition::LlmGuidance => self.accuracy[2],
        }
    }
}

fn raw<T: Category>(map: &LabelMap<T>, value: T) -> Result<String> {
    map.raw_label(value)
        .map(str::to_string)
        .ok_or_else(|| AnalysisError::Config(format!("no raw label for {:?}", value)))
}

fn pick<T: Category>(rng: &mut StdRng) -> T {
    T::ALL[rng.gen_range(0..T::ALL.len())]
}

/// Generate participants, responses and fluency listings
pub fn generate(sim: &SimulationConfig, config: &AnalysisConfig) -> Result<RawTables> {
    sim.validate()?;
    let mut rng = StdRng::seed_from_u64(sim.seed);
    let labels = &config.labels;

    let participant_headers: Vec<String> = config
        .columns
        .all()
        .iter()
        .map(|c| c.to_string())
        .collect();
    let mut participants = Vec::new();
    let mut responses = Vec::new();
    let mut fluency = Vec::new();

    for (c_idx, condition) in Condition::ALL.iter().enumerate() {
        let condition_raw = raw(&labels.condition, *condition)?;

        for i in 0..sim.per_condition {
            let workerid = format!("sim-{}-{:03}", c_idx, i);
            let attention = if rng.gen_bool(sim.attention_fail_rate) {
                "Disagree".to_string()
            } else {
                config.attention_pass.clone()
            };
            let pre_creative = rng.gen_range(1..=7);
            let post_creative = rng.gen_range(1..=7);
            // not asked in the unassisted condition
            let helpfulness = match condition {
                Condition::Unassisted => config.helpful_not_asked.clone(),
                _ => raw(&labels.helpfulness, pick::<Helpfulness>(&mut rng))?,
            };

            participants.push(vec![
                workerid.clone(),
                condition_raw.clone(),
                attention,
                pre_creative.to_string(),
                post_creative.to_string(),
                raw(&labels.ai_sentiment, pick::<AiSentiment>(&mut rng))?,
                raw(&labels.ai_sentiment, pick::<AiSentiment>(&mut rng))?,
                raw(&labels.difficulty, pick::<Difficulty>(&mut rng))?,
                helpfulness,
            ]);

            let trials = [
                (Phase::Exposure, sim.practice_trials, 0.5),
                (Phase::Test, sim.test_trials, sim.accuracy_for(*condition)),
            ];
            for (phase, count, accuracy) in trials {
                let phase_raw = raw(&labels.phase, phase)?;
                for _ in 0..count {
                    let correct = rng.gen_bool(accuracy);
                    responses.push(vec![
                        workerid.clone(),
                        phase_raw.clone(),
                        condition_raw.clone(),
                        u8::from(correct).to_string(),
                    ]);
                }
            }

            let words = rng.gen_range(sim.fluency_range.0..=sim.fluency_range.1);
            for w in 0..words {
                fluency.push(vec![workerid.clone(), format!("word{}", w)]);
            }
        }
    }

    tracing::info!(
        participants = participants.len(),
        responses = responses.len(),
        fluency_entries = fluency.len(),
        seed = sim.seed,
        "simulated study generated"
    );

    Ok(RawTables {
        participants: Table::new(PARTICIPANTS, participant_headers, participants),
        responses: Table::new(
            RESPONSES,
            Response::columns(config).map(str::to_string).to_vec(),
            responses,
        ),
        fluency: Table::new(
            FLUENCY,
            vec![config.columns.workerid.clone(), "word".to_string()],
            fluency,
        ),
    })
}

/// Write the three tables as `participants.csv`, `responses.csv`, `fluency.csv`
pub fn write_tables(tables: &RawTables, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(3);
    for table in [&tables.participants, &tables.responses, &tables.fluency] {
        let path = dir.join(format!("{}.csv", table.name()));
        table.write_csv(std::fs::File::create(&path)?)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Participant;

    #[test]
    fn test_default_shape() {
        let raw = generate(&SimulationConfig::default(), &AnalysisConfig::default()).unwrap();
        assert_eq!(raw.participants.len(), 90);
        assert_eq!(raw.responses.len(), 90 * 13);
        let words = raw.fluency.len();
        assert!((90 * 5..=90 * 25).contains(&words));
    }

    #[test]
    fn test_output_parses_with_same_config() {
        let config = AnalysisConfig::default();
        let raw = generate(&SimulationConfig::default(), &config).unwrap();
        let participants = Participant::parse_table(&raw.participants, &config).unwrap();
        let responses = Response::parse_table(&raw.responses, &config).unwrap();
        assert_eq!(participants.len(), 90);
        assert!(responses.iter().all(|r| participants
            .iter()
            .any(|p| p.workerid == r.workerid && p.condition == r.condition)));
    }

    #[test]
    fn test_same_seed_same_tables() {
        let config = AnalysisConfig::default();
        let a = generate(&SimulationConfig::default(), &config).unwrap();
        let b = generate(&SimulationConfig::default(), &config).unwrap();
        assert_eq!(a.responses, b.responses);
        assert_eq!(a.participants, b.participants);

        let other = SimulationConfig {
            seed: 7,
            ..SimulationConfig::default()
        };
        let c = generate(&other, &config).unwrap();
        assert_ne!(a.responses, c.responses);
    }

    #[test]
    fn test_attention_failures_are_generated() {
        let sim = SimulationConfig {
            attention_fail_rate: 1.0,
            per_condition: 2,
            ..SimulationConfig::default()
        };
        let raw = generate(&sim, &AnalysisConfig::default()).unwrap();
        let idx = raw.participants.column_index("attention_check").unwrap();
        assert!(raw.participants.rows().iter().all(|r| r[idx] == "Disagree"));
    }

    #[test]
    fn test_invalid_accuracy_is_rejected() {
        let sim = SimulationConfig {
            accuracy: [0.5, 1.5, 0.7],
            ..SimulationConfig::default()
        };
        assert!(generate(&sim, &AnalysisConfig::default()).is_err());
    }

    #[test]
    fn test_write_tables_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sim = SimulationConfig {
            per_condition: 3,
            ..SimulationConfig::default()
        };
        let raw = generate(&sim, &AnalysisConfig::default()).unwrap();
        let paths = write_tables(&raw, dir.path()).unwrap();
        assert_eq!(paths.len(), 3);

        let back = RawTables::from_paths(&paths[0], &paths[1], &paths[2]).unwrap();
        assert_eq!(back.participants.len(), 9);
        assert_eq!(back.responses.len(), raw.responses.len());
    }
}
