// Covariate-adjusted group comparison
//
// Fits `outcome ~ covariate + factor` by least squares, decomposes it into a
// sequential (Type I) ANOVA table with the covariate entered first, then
// compares every pair of factor levels by Tukey's HSD on the estimated
// marginal means.
//
// Scientific Foundation:
// [1] Tukey, J. W. (1953). The problem of multiple comparisons. Princeton.
// [2] Copenhaver, M. D., & Holland, B. (1988). Computation of the distribution
//     of the maximum studentized range statistic. J. Stat. Comput. Simul. 30.
//
// Implementation:
// - nalgebra for the design matrix, Cholesky solve and rank check
// - statrs for the F distribution, erfc and ln_gamma
// - studentized range integrated locally (statrs does not ship it)

mod anova;
mod linear;
mod posthoc;
mod tukey;

pub use anova::{
    fit_covariate_model, AnovaRow, AnovaTable, CovariateModel, CovariateObservation, RESIDUALS,
};
pub use linear::{fit as least_squares, LeastSquares};
pub use posthoc::{tukey_hsd, MarginalMean, PostHocResult, TukeyHsd};
pub use tukey::{ptukey, qtukey};
