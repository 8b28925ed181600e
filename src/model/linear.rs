// Ordinary least squares on a dense design matrix
//
// Normal equations solved by Cholesky, as cardinal's rating engine does for
// its Gram matrices. Rank is checked by SVD first so collinear designs fail
// with a ModelFit error instead of producing meaningless coefficients.

use crate::error::{AnalysisError, Result};
use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector};

/// Singular values below this fraction of the largest count as zero
const RANK_TOLERANCE: f64 = 1e-10;

/// Fitted least-squares solution
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub coefficients: DVector<f64>,
    /// Residual sum of squares
    pub rss: f64,
    /// (X'X)^-1, scaled by the residual variance to give coefficient covariance
    pub xtx_inv: DMatrix<f64>,
}

/// Numerical rank of `x`
pub fn rank(x: &DMatrix<f64>) -> usize {
    if x.is_empty() {
        return 0;
    }
    let singular = x.clone().svd(false, false).singular_values;
    let largest = singular.max();
    if largest <= 0.0 {
        return 0;
    }
    singular.iter().filter(|s| **s > largest * RANK_TOLERANCE).count()
}

/// Fit `y ~ x` by least squares
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<LeastSquares> {
    let (n, p) = x.shape();
    if n != y.len() {
        return Err(AnalysisError::ModelFit(format!(
            "design has {} rows but response has {} values",
            n,
            y.len()
        )));
    }
    if n < p {
        return Err(AnalysisError::ModelFit(format!(
            "{} observations cannot identify {} parameters",
            n, p
        )));
    }

    let r = rank(x);
    if r < p {
        return Err(AnalysisError::ModelFit(format!(
            "design matrix is rank deficient (rank {} of {}); terms are collinear",
            r, p
        )));
    }

    let xt = x.transpose();
    let chol = Cholesky::new(&xt * x).ok_or_else(|| {
        AnalysisError::ModelFit("normal equations are not positive definite".to_string())
    })?;

    let coefficients = chol.solve(&(&xt * y));
    let residuals = y - x * &coefficients;

    Ok(LeastSquares {
        rss: residuals.norm_squared(),
        xtx_inv: chol.inverse(),
        coefficients,
    })
}
