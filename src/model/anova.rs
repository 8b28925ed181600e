// Covariate-adjusted one-way ANOVA (ANCOVA) with sequential sums of squares
//
// Model: outcome ~ covariate + factor, treatment coding with the first level
// present as reference. Terms enter in that order, so the factor row is the
// effect of the factor after partialling out the covariate (Type I SS):
//
//   SS(covariate) = RSS(1)             - RSS(1 + covariate)
//   SS(factor)    = RSS(1 + covariate) - RSS(1 + covariate + factor)

use super::linear;
use crate::error::{AnalysisError, Result};
use crate::labels::Category;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// One row of model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovariateObservation<L> {
    pub outcome: f64,
    pub covariate: f64,
    pub level: L,
}

/// One term of the ANOVA table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaRow {
    pub term: String,
    pub df: usize,
    pub sum_sq: f64,
    pub mean_sq: f64,
    /// `None` for the residual row
    pub f_value: Option<f64>,
    pub p_value: Option<f64>,
}

/// Sequential ANOVA table: covariate, factor, residuals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaTable {
    pub rows: Vec<AnovaRow>,
}

impl AnovaTable {
    pub fn term(&self, name: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.term == name)
    }

    pub fn residuals(&self) -> Option<&AnovaRow> {
        self.term(RESIDUALS)
    }
}

pub const RESIDUALS: &str = "Residuals";

/// A fitted ANCOVA model, ready for post-hoc comparison
#[derive(Debug, Clone)]
pub struct CovariateModel<L> {
    pub covariate_name: String,
    pub factor_name: String,
    /// Factor levels present in the data, canonical order; the first is the reference
    pub levels: Vec<L>,
    /// Intercept, covariate slope, then one effect per non-reference level
    pub coefficients: Vec<f64>,
    /// Coefficient covariance matrix: MSE * (X'X)^-1
    pub covariance: DMatrix<f64>,
    pub covariate_mean: f64,
    pub n: usize,
    pub residual_df: usize,
    pub residual_mean_sq: f64,
    pub anova: AnovaTable,
}

impl<L: Category> CovariateModel<L> {
    /// Index of `level` in `levels`
    pub fn level_index(&self, level: L) -> Option<usize> {
        self.levels.iter().position(|l| *l == level)
    }
}

/// Fit `outcome ~ covariate + factor` and decompose it sequentially
pub fn fit_covariate_model<L: Category>(
    observations: &[CovariateObservation<L>],
    covariate_name: &str,
    factor_name: &str,
) -> Result<CovariateModel<L>> {
    let n = observations.len();

    if let Some(bad) = observations
        .iter()
        .find(|o| !o.outcome.is_finite() || !o.covariate.is_finite())
    {
        return Err(AnalysisError::ModelFit(format!(
            "non-finite value in model input (outcome {}, {} {})",
            bad.outcome, covariate_name, bad.covariate
        )));
    }

    let levels: Vec<L> = L::ALL
        .iter()
        .copied()
        .filter(|l| observations.iter().any(|o| o.level == *l))
        .collect();
    let k = levels.len();
    if k < 2 {
        return Err(AnalysisError::ModelFit(format!(
            "factor '{}' needs at least two levels with data, found {}",
            factor_name, k
        )));
    }

    let p = k + 1;
    if n <= p {
        return Err(AnalysisError::ModelFit(format!(
            "{} observations leave no residual degrees of freedom for {} parameters",
            n, p
        )));
    }

    let x = DMatrix::from_fn(n, p, |i, j| {
        let obs = &observations[i];
        match j {
            0 => 1.0,
            1 => obs.covariate,
            _ => f64::from(u8::from(obs.level == levels[j - 1])),
        }
    });
    let y = DVector::from_iterator(n, observations.iter().map(|o| o.outcome));

    let mean_y = y.mean();
    let rss_null: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();

    let reduced = linear::fit(&x.columns(0, 2).into_owned(), &y).map_err(|e| match e {
        AnalysisError::ModelFit(msg) => {
            AnalysisError::ModelFit(format!("covariate '{}': {}", covariate_name, msg))
        }
        other => other,
    })?;
    let full = linear::fit(&x, &y)?;

    let residual_df = n - p;
    let residual_mean_sq = full.rss / residual_df as f64;

    let ss_covariate = (rss_null - reduced.rss).max(0.0);
    let ss_factor = (reduced.rss - full.rss).max(0.0);

    let anova = AnovaTable {
        rows: vec![
            term_row(covariate_name, 1, ss_covariate, residual_mean_sq, residual_df),
            term_row(factor_name, k - 1, ss_factor, residual_mean_sq, residual_df),
            AnovaRow {
                term: RESIDUALS.to_string(),
                df: residual_df,
                sum_sq: full.rss,
                mean_sq: residual_mean_sq,
                f_value: None,
                p_value: None,
            },
        ],
    };

    tracing::info!(
        n,
        levels = k,
        residual_df,
        factor_f = ?anova.rows[1].f_value,
        factor_p = ?anova.rows[1].p_value,
        "covariate model fitted"
    );

    Ok(CovariateModel {
        covariate_name: covariate_name.to_string(),
        factor_name: factor_name.to_string(),
        levels,
        coefficients: full.coefficients.iter().copied().collect(),
        covariance: full.xtx_inv * residual_mean_sq,
        covariate_mean: observations.iter().map(|o| o.covariate).sum::<f64>() / n as f64,
        n,
        residual_df,
        residual_mean_sq,
        anova,
    })
}

fn term_row(term: &str, df: usize, sum_sq: f64, mse: f64, residual_df: usize) -> AnovaRow {
    let mean_sq = sum_sq / df as f64;
    let (f_value, p_value) = f_test(mean_sq, df, mse, residual_df);
    AnovaRow {
        term: term.to_string(),
        df,
        sum_sq,
        mean_sq,
        f_value: Some(f_value),
        p_value: Some(p_value),
    }
}

/// F statistic and upper-tail p-value; a perfect fit (MSE = 0) gives F = inf, p = 0
fn f_test(mean_sq: f64, df: usize, mse: f64, residual_df: usize) -> (f64, f64) {
    if mse <= 0.0 {
        return if mean_sq > 0.0 {
            (f64::INFINITY, 0.0)
        } else {
            (f64::NAN, f64::NAN)
        };
    }

    let f_value = mean_sq / mse;
    let p_value = match FisherSnedecor::new(df as f64, residual_df as f64) {
        Ok(dist) => dist.sf(f_value),
        Err(e) => {
            tracing::warn!("F distribution unavailable: {}", e);
            f64::NAN
        }
    };
    (f_value, p_value)
}
