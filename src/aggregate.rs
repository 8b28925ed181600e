//! Two-level aggregation of an outcome
//!
//! Repeated rows are first collapsed to one mean per (subject, group key);
//! group statistics are then computed across those subject means, so the unit
//! of analysis is the subject, not the trial.
//!
//! Standard error convention: SEM = sample SD (n - 1) / sqrt(n). A group with
//! one subject has SEM = 0; a group with no subjects has mean and SEM = NaN.
//! Both cases also produce an [`AggregateWarning`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// One outcome value for one subject under one group key
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<K> {
    pub subject: String,
    pub key: K,
    pub value: f64,
}

impl<K> Observation<K> {
    pub fn new(subject: impl Into<String>, key: K, value: f64) -> Self {
        Self {
            subject: subject.into(),
            key,
            value,
        }
    }
}

/// Mean, standard error and subject count of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow<K> {
    pub key: K,
    pub mean: f64,
    pub sem: f64,
    pub n: usize,
}

/// Recoverable problem with a group's size
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateWarning {
    /// No subjects; mean and SEM are NaN
    EmptyGroup { group: String },
    /// One subject; SEM reported as 0
    SingleSubject { group: String },
}

/// Summary rows in key order, plus any group-size warnings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary<K> {
    pub rows: Vec<SummaryRow<K>>,
    pub warnings: Vec<AggregateWarning>,
}

impl<K: Ord> Summary<K> {
    pub fn get(&self, key: &K) -> Option<&SummaryRow<K>> {
        self.rows.iter().find(|r| &r.key == key)
    }
}

/// Per-subject means for each (key, subject) pair, ordered by key then subject
pub fn subject_means<K: Ord + Clone>(
    observations: impl IntoIterator<Item = Observation<K>>,
) -> BTreeMap<K, BTreeMap<String, f64>> {
    let mut sums: BTreeMap<K, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
    for obs in observations {
        let entry = sums
            .entry(obs.key)
            .or_default()
            .entry(obs.subject)
            .or_insert((0.0, 0));
        entry.0 += obs.value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(key, subjects)| {
            let means = subjects
                .into_iter()
                .map(|(subject, (sum, count))| (subject, sum / count as f64))
                .collect();
            (key, means)
        })
        .collect()
}

/// Mean and SEM of a set of subject means
///
/// Returns `(NaN, NaN)` for an empty slice and `(v, 0.0)` for a single value.
pub fn mean_and_sem(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return (mean, 0.0);
    }

    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let sd = (ss / (n - 1) as f64).sqrt();
    (mean, sd / (n as f64).sqrt())
}

/// Aggregate observations over the keys that occur in them
pub fn summarize<K: Ord + Clone + Debug>(
    observations: impl IntoIterator<Item = Observation<K>>,
) -> Summary<K> {
    summarize_levels(observations, &[])
}

/// Aggregate observations, also emitting a row for every key in `levels`
///
/// Keys listed in `levels` but absent from the data produce NaN rows, so a
/// condition emptied by screening still shows up in the output.
pub fn summarize_levels<K: Ord + Clone + Debug>(
    observations: impl IntoIterator<Item = Observation<K>>,
    levels: &[K],
) -> Summary<K> {
    let mut by_key = subject_means(observations);
    for level in levels {
        by_key.entry(level.clone()).or_default();
    }

    let mut rows = Vec::with_capacity(by_key.len());
    let mut warnings = Vec::new();
    for (key, subjects) in by_key {
        let values: Vec<f64> = subjects.into_values().collect();
        let (mean, sem) = mean_and_sem(&values);

        match values.len() {
            0 => {
                tracing::warn!(group = ?key, "empty group; mean and SEM undefined");
                warnings.push(AggregateWarning::EmptyGroup {
                    group: format!("{:?}", key),
                });
            }
            1 => {
                tracing::warn!(group = ?key, "single-subject group; SEM reported as 0");
                warnings.push(AggregateWarning::SingleSubject {
                    group: format!("{:?}", key),
                });
            }
            n => tracing::debug!(group = ?key, n, mean, sem, "group summarized"),
        }

        rows.push(SummaryRow {
            key,
            mean,
            sem,
            n: values.len(),
        });
    }

    Summary { rows, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_mean_collapses_trials_first() {
        // s1 has 4 trials (mean 1.0), s2 has 1 trial (mean 0.0):
        // subject-level mean is 0.5, not the trial-level 0.8
        let obs = vec![
            Observation::new("s1", "A", 1.0),
            Observation::new("s1", "A", 1.0),
            Observation::new("s1", "A", 1.0),
            Observation::new("s1", "A", 1.0),
            Observation::new("s2", "A", 0.0),
        ];
        let summary = summarize(obs);
        let row = summary.get(&"A").unwrap();
        assert_eq!(row.n, 2);
        assert!((row.mean - 0.5).abs() < 1e-12);
        // sd of [1, 0] = sqrt(0.5); sem = sqrt(0.5)/sqrt(2) = 0.5
        assert!((row.sem - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_subject_group_has_zero_sem() {
        let summary = summarize(vec![
            Observation::new("only", 1u8, 0.75),
            Observation::new("only", 1u8, 0.25),
        ]);
        let row = summary.get(&1).unwrap();
        assert_eq!(row.n, 1);
        assert_eq!(row.mean, 0.5);
        assert_eq!(row.sem, 0.0);
        assert_eq!(summary.warnings.len(), 1);
        assert!(matches!(
            summary.warnings[0],
            AggregateWarning::SingleSubject { .. }
        ));
    }

    #[test]
    fn test_missing_level_yields_nan_row() {
        let summary = summarize_levels(vec![Observation::new("s1", 1u8, 1.0)], &[1u8, 2u8]);
        assert_eq!(summary.rows.len(), 2);
        let empty = summary.get(&2).unwrap();
        assert_eq!(empty.n, 0);
        assert!(empty.mean.is_nan());
        assert!(empty.sem.is_nan());
        assert!(summary
            .warnings
            .iter()
            .any(|w| matches!(w, AggregateWarning::EmptyGroup { .. })));
    }

    #[test]
    fn test_rows_follow_key_order() {
        let summary = summarize(vec![
            Observation::new("a", (2u8, 'x'), 1.0),
            Observation::new("b", (1u8, 'y'), 1.0),
            Observation::new("c", (1u8, 'x'), 1.0),
        ]);
        let keys: Vec<_> = summary.rows.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![(1, 'x'), (1, 'y'), (2, 'x')]);
    }

    #[test]
    fn test_mean_and_sem_known_values() {
        let (mean, sem) = mean_and_sem(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        // sample sd = sqrt(32/7)
        let expected = (32.0f64 / 7.0).sqrt() / 8f64.sqrt();
        assert!((sem - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_has_no_rows() {
        let summary: Summary<u8> = summarize(Vec::new());
        assert!(summary.rows.is_empty());
        assert!(summary.warnings.is_empty());
    }
}
