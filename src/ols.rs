//! Ordinary least squares on demeaned data via the normal equations.

use nalgebra::{DMatrix, DVector};

use crate::error::{FeError, Result};

/// Relative tolerance used when rank-checking `X'X`.
const RANK_EPS: f64 = 1e-12;

/// Output of a least-squares fit, carrying the pieces the variance estimator
/// needs downstream.
#[derive(Clone, Debug)]
pub struct OlsFit {
    /// Coefficient vector, one entry per design column.
    pub beta: DVector<f64>,
    /// Residuals `e = y - X beta`.
    pub residuals: DVector<f64>,
    /// Gram matrix `X'X`, reused as the bread of the sandwich estimator.
    pub xtx: DMatrix<f64>,
}

/// Solves `beta = (X'X)^{-1} X'y` and computes residuals.
///
/// A rank-deficient `X'X` fails with [`FeError::SingularDesign`] rather than
/// returning coefficients that are artifacts of a degenerate system.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit> {
    let n = y.len();
    if x.nrows() != n {
        return Err(FeError::dimension_mismatch("design rows", n, x.nrows()));
    }
    let k = x.ncols();
    if k == 0 {
        return Err(FeError::dimension_mismatch("design columns", 1, 0));
    }

    let xtx = x.transpose() * x;

    // Scale-relative rank check; exact collinearity among design columns shows
    // up here before the factorization can hide it behind a tiny pivot.
    let scale = xtx.diagonal().amax();
    if scale == 0.0 || xtx.rank(scale * RANK_EPS) < k {
        return Err(FeError::singular("X'X"));
    }

    let rhs = x.transpose() * y;
    let cholesky =
        nalgebra::linalg::Cholesky::new(xtx.clone()).ok_or_else(|| FeError::singular("X'X"))?;
    let beta = cholesky.solve(&rhs);
    let residuals = y - x * &beta;

    Ok(OlsFit {
        beta,
        residuals,
        xtx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn slope_matches_textbook_simple_regression() {
        // Globally demeaned data: the coefficient must equal Cov(x, y)/Var(x).
        let raw_x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let raw_y = [2.0, 2.5, 3.0, 5.0, 4.5];
        let mean_x: f64 = raw_x.iter().sum::<f64>() / raw_x.len() as f64;
        let mean_y: f64 = raw_y.iter().sum::<f64>() / raw_y.len() as f64;

        let xd: Vec<f64> = raw_x.iter().map(|v| v - mean_x).collect();
        let yd: Vec<f64> = raw_y.iter().map(|v| v - mean_y).collect();

        let cov: f64 = xd.iter().zip(&yd).map(|(a, b)| a * b).sum();
        let var: f64 = xd.iter().map(|a| a * a).sum();

        let x = DMatrix::from_column_slice(5, 1, &xd);
        let y = DVector::from_vec(yd);
        let fit = fit_ols(&x, &y).unwrap();

        assert_relative_eq!(fit.beta[0], cov / var, epsilon = 1e-12);
    }

    #[test]
    fn residuals_are_orthogonal_to_design() {
        let x = DMatrix::from_column_slice(4, 2, &[1.0, -1.0, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5]);
        let y = DVector::from_vec(vec![1.2, -0.7, 0.1, -0.6]);
        let fit = fit_ols(&x, &y).unwrap();

        let xte = x.transpose() * &fit.residuals;
        assert_relative_eq!(xte.amax(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn exact_collinearity_fails_clean() {
        // Second column is an exact multiple of the first.
        let x = DMatrix::from_column_slice(4, 2, &[1.0, 2.0, 3.0, 4.0, 2.0, 4.0, 6.0, 8.0]);
        let y = DVector::from_vec(vec![1.0, 0.0, 1.0, 0.0]);
        let result = fit_ols(&x, &y);
        assert!(matches!(result, Err(FeError::SingularDesign { .. })));
    }

    #[test]
    fn zero_design_fails_clean() {
        let x = DMatrix::from_column_slice(3, 1, &[0.0, 0.0, 0.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let result = fit_ols(&x, &y);
        assert!(matches!(result, Err(FeError::SingularDesign { .. })));
    }
}
