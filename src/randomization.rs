// Randomization balance check
//
// Chi-squared goodness-of-fit of the per-condition group sizes against equal
// assignment probabilities. The result is reported only; nothing downstream
// branches on it.

use crate::labels::{Category, Condition};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::BTreeMap;

/// Result of the goodness-of-fit test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceTest {
    /// Observed group size per condition, in canonical order
    pub group_sizes: Vec<usize>,

    /// Pearson chi-squared statistic
    pub statistic: f64,

    /// Degrees of freedom (groups - 1)
    pub df: usize,

    /// Upper-tail p-value; p < 0.05 suggests detectable imbalance
    pub pvalue: f64,
}

/// Chi-squared goodness-of-fit against equal group probabilities
///
/// With fewer than two groups or zero total count the test is undefined and
/// the statistic and p-value are NaN.
///
/// # Example
/// ```
/// use convergent::randomization::chi_squared_uniform;
///
/// let test = chi_squared_uniform(&[50, 50, 50]);
/// assert_eq!(test.statistic, 0.0);
/// assert!((test.pvalue - 1.0).abs() < 1e-12);
/// ```
pub fn chi_squared_uniform(group_sizes: &[usize]) -> BalanceTest {
    let k = group_sizes.len();
    let total: usize = group_sizes.iter().sum();
    let df = k.saturating_sub(1);

    if k < 2 || total == 0 {
        tracing::warn!(groups = k, total, "balance test undefined");
        return BalanceTest {
            group_sizes: group_sizes.to_vec(),
            statistic: f64::NAN,
            df,
            pvalue: f64::NAN,
        };
    }

    let expected = total as f64 / k as f64;
    let statistic: f64 = group_sizes
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    let pvalue = match ChiSquared::new(df as f64) {
        Ok(dist) => dist.sf(statistic),
        Err(e) => {
            tracing::warn!("chi-squared distribution unavailable: {}", e);
            f64::NAN
        }
    };

    BalanceTest {
        group_sizes: group_sizes.to_vec(),
        statistic,
        df,
        pvalue,
    }
}

/// Count participants per condition, including empty conditions
pub fn condition_sizes<'a>(conditions: impl IntoIterator<Item = &'a Condition>) -> Vec<usize> {
    let mut counts: BTreeMap<Condition, usize> =
        Condition::ALL.iter().map(|c| (*c, 0)).collect();
    for condition in conditions {
        *counts.entry(*condition).or_default() += 1;
    }
    counts.into_values().collect()
}

/// Balance test over the conditions of the retained participants
pub fn check_balance<'a>(conditions: impl IntoIterator<Item = &'a Condition>) -> BalanceTest {
    let test = chi_squared_uniform(&condition_sizes(conditions));
    if test.pvalue < 0.05 {
        tracing::warn!(
            statistic = test.statistic,
            pvalue = test.pvalue,
            "condition group sizes look unbalanced"
        );
    } else {
        tracing::info!(
            statistic = test.statistic,
            pvalue = test.pvalue,
            "randomization balance checked"
        );
    }
    test
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_groups() {
        let test = chi_squared_uniform(&[50, 50, 50]);
        assert_eq!(test.df, 2);
        assert!(test.statistic.abs() < 1e-12);
        assert!((test.pvalue - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_known_statistic() {
        // expected 30 each: (20-30)^2/30 + 0 + (40-30)^2/30 = 6.667
        let test = chi_squared_uniform(&[20, 30, 40]);
        assert!((test.statistic - 20.0 / 3.0).abs() < 1e-9);
        // chi2(2) survival = exp(-x/2)
        assert!((test.pvalue - (-10.0f64 / 3.0).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_strong_imbalance_is_significant() {
        let test = chi_squared_uniform(&[10, 50, 90]);
        assert!(test.pvalue < 0.001);
    }

    #[test]
    fn test_empty_input_is_nan() {
        let test = chi_squared_uniform(&[0, 0, 0]);
        assert!(test.statistic.is_nan());
        assert!(test.pvalue.is_nan());

        let single = chi_squared_uniform(&[10]);
        assert!(single.pvalue.is_nan());
    }

    #[test]
    fn test_condition_sizes_include_empty_groups() {
        let conditions = [Condition::LlmGuidance, Condition::LlmGuidance];
        assert_eq!(condition_sizes(conditions.iter()), vec![0, 0, 2]);
    }
}
