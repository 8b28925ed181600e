// Pairwise comparisons of estimated marginal means, Tukey HSD
//
// Marginal means are evaluated at the overall covariate mean. For a pair the
// adjusted p-value and simultaneous interval come from the studentized range
// with `k` means (levels in the model) and the model's residual df.

use super::anova::CovariateModel;
use super::tukey::{ptukey, qtukey};
use crate::error::{AnalysisError, Result};
use crate::labels::Category;
use nalgebra::DVector;
use serde::Serialize;
use std::f64::consts::SQRT_2;

/// Model-adjusted mean of one factor level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginalMean<L> {
    pub level: L,
    pub emmean: f64,
    pub se: f64,
}

/// One pairwise comparison, `level_b - level_a`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHocResult<L> {
    /// Display label, e.g. "LLM Answer - None"
    pub contrast: String,
    pub level_a: L,
    pub level_b: L,
    pub estimate: f64,
    pub se: f64,
    pub lower: f64,
    pub upper: f64,
    pub p_adjusted: f64,
    pub significant: bool,
}

/// The whole comparison family for one fitted model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TukeyHsd<L> {
    pub factor: String,
    pub confidence_level: f64,
    /// Number of means in the family (k)
    pub family_size: usize,
    pub residual_df: usize,
    /// Studentized range critical value q(1 - alpha; k, df)
    pub q_critical: f64,
    pub marginal_means: Vec<MarginalMean<L>>,
    pub results: Vec<PostHocResult<L>>,
}

impl<L: Category> TukeyHsd<L> {
    pub fn pair(&self, a: L, b: L) -> Option<&PostHocResult<L>> {
        self.results
            .iter()
            .find(|r| (r.level_a == a && r.level_b == b) || (r.level_a == b && r.level_b == a))
    }
}

/// Linear combination of coefficients giving the marginal mean of level `idx`
fn marginal_vector<L>(model: &CovariateModel<L>, idx: usize) -> DVector<f64> {
    let p = model.coefficients.len();
    let mut l = DVector::zeros(p);
    l[0] = 1.0;
    l[1] = model.covariate_mean;
    if idx > 0 {
        l[idx + 1] = 1.0;
    }
    l
}

fn estimate_and_se<L>(model: &CovariateModel<L>, c: &DVector<f64>) -> (f64, f64) {
    let beta = DVector::from_column_slice(&model.coefficients);
    let estimate = c.dot(&beta);
    let variance = (c.transpose() * &model.covariance * c)[(0, 0)];
    (estimate, variance.max(0.0).sqrt())
}

/// All k(k-1)/2 pairwise Tukey comparisons at family-wise level `alpha`
pub fn tukey_hsd<L: Category>(model: &CovariateModel<L>, alpha: f64) -> Result<TukeyHsd<L>> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AnalysisError::Config(format!(
            "significance level must lie in (0, 1), got {}",
            alpha
        )));
    }

    let k = model.levels.len();
    let df = model.residual_df as f64;
    let q_critical = qtukey(1.0 - alpha, k, df);
    if q_critical.is_nan() {
        return Err(AnalysisError::ModelFit(format!(
            "studentized range undefined for {} means and {} residual df",
            k, model.residual_df
        )));
    }

    let vectors: Vec<DVector<f64>> = (0..k).map(|i| marginal_vector(model, i)).collect();

    let marginal_means = model
        .levels
        .iter()
        .zip(&vectors)
        .map(|(level, l)| {
            let (emmean, se) = estimate_and_se(model, l);
            MarginalMean {
                level: *level,
                emmean,
                se,
            }
        })
        .collect();

    let mut results = Vec::with_capacity(k * (k - 1) / 2);
    for i in 0..k {
        for j in (i + 1)..k {
            let (level_a, level_b) = (model.levels[i], model.levels[j]);
            let contrast = &vectors[j] - &vectors[i];
            let (estimate, se) = estimate_and_se(model, &contrast);

            let p_adjusted = if se > 0.0 {
                (1.0 - ptukey(estimate.abs() / se * SQRT_2, k, df)).clamp(0.0, 1.0)
            } else if estimate == 0.0 {
                1.0
            } else {
                0.0
            };
            let half_width = q_critical / SQRT_2 * se;

            results.push(PostHocResult {
                contrast: format!("{} - {}", level_b.label(), level_a.label()),
                level_a,
                level_b,
                estimate,
                se,
                lower: estimate - half_width,
                upper: estimate + half_width,
                p_adjusted,
                significant: p_adjusted < alpha,
            });
        }
    }

    for r in &results {
        tracing::debug!(
            contrast = %r.contrast,
            estimate = r.estimate,
            p_adjusted = r.p_adjusted,
            "tukey comparison"
        );
    }

    Ok(TukeyHsd {
        factor: model.factor_name.clone(),
        confidence_level: 1.0 - alpha,
        family_size: k,
        residual_df: model.residual_df,
        q_critical,
        marginal_means,
        results,
    })
}
