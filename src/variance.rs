//! Cluster-robust ("sandwich") covariance for the fitted coefficients.

use nalgebra::{DMatrix, DVector};

use crate::demean::Grouping;
use crate::error::{FeError, Result};

/// Computes the cluster-robust variance-covariance matrix
/// `V = (X'X)^{-1} Sigma (X'X)^{-1} * G/(G-1)`.
///
/// `Sigma` is the outer-product sum of per-cluster scores `s_c = X_c' e_c`,
/// allowing arbitrary correlation of residuals within each cluster. The
/// `G/(G-1)` factor is the conventional small-sample correction, so at least
/// two distinct clusters are required.
pub fn cluster_robust_covariance(
    x: &DMatrix<f64>,
    residuals: &DVector<f64>,
    clusters: &Grouping,
    xtx: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let n = x.nrows();
    let k = x.ncols();
    if residuals.len() != n {
        return Err(FeError::dimension_mismatch(
            "residual length",
            n,
            residuals.len(),
        ));
    }
    if clusters.len() != n {
        return Err(FeError::dimension_mismatch(
            "cluster length",
            n,
            clusters.len(),
        ));
    }
    if xtx.nrows() != k || xtx.ncols() != k {
        return Err(FeError::dimension_mismatch("X'X order", k, xtx.nrows()));
    }

    let g = clusters.group_count();
    if g <= 1 {
        return Err(FeError::InsufficientClusters { found: g });
    }

    // Scores stacked one row per cluster; the meat is then S'S.
    let mut scores = DMatrix::<f64>::zeros(g, k);
    for (row, &code) in clusters.codes().iter().enumerate() {
        let e = residuals[row];
        for col in 0..k {
            scores[(code, col)] += x[(row, col)] * e;
        }
    }
    let meat = scores.transpose() * &scores;

    let bread = nalgebra::linalg::Cholesky::new(xtx.clone())
        .ok_or_else(|| FeError::singular("X'X inversion"))?
        .inverse();

    let correction = g as f64 / (g as f64 - 1.0);
    Ok(&bread * meat * &bread * correction)
}

/// Extracts standard errors as square roots of the covariance diagonal.
///
/// A negative diagonal entry is reported as [`FeError::NegativeVariance`]
/// instead of letting `sqrt` hand back `NaN`.
pub fn standard_errors(covariance: &DMatrix<f64>) -> Result<DVector<f64>> {
    let k = covariance.nrows();
    let mut errors = DVector::zeros(k);
    for index in 0..k {
        let value = covariance[(index, index)];
        if value < 0.0 {
            return Err(FeError::NegativeVariance { index, value });
        }
        errors[index] = value.sqrt();
    }
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn demeaned_fixture() -> (DMatrix<f64>, DVector<f64>, DMatrix<f64>) {
        let x = DMatrix::from_column_slice(4, 1, &[0.5, -0.5, 0.5, -0.5]);
        let residuals = DVector::from_vec(vec![0.3, -0.1, -0.2, 0.4]);
        let xtx = x.transpose() * &x;
        (x, residuals, xtx)
    }

    #[test]
    fn singleton_clusters_match_white_variance() {
        let (x, residuals, xtx) = demeaned_fixture();
        let clusters = Grouping::from_labels(&["c1", "c2", "c3", "c4"]);

        let covariance = cluster_robust_covariance(&x, &residuals, &clusters, &xtx).unwrap();

        // With one observation per cluster each score is that row's score, so
        // the estimator collapses to White's, up to the same G/(G-1) factor.
        let meat: f64 = (0..4)
            .map(|row| (x[(row, 0)] * residuals[row]).powi(2))
            .sum();
        let white = meat / xtx[(0, 0)].powi(2) * (4.0 / 3.0);
        assert_relative_eq!(covariance[(0, 0)], white, epsilon = 1e-12);
    }

    #[test]
    fn scalar_specialization_matches_matrix_path() {
        let (x, residuals, xtx) = demeaned_fixture();
        let clusters = Grouping::from_labels(&["a", "b", "a", "b"]);

        let covariance = cluster_robust_covariance(&x, &residuals, &clusters, &xtx).unwrap();

        // k = 1 closed form: V = sum_c s_c^2 / (X'X)^2, corrected by G/(G-1).
        let s_a = x[(0, 0)] * residuals[0] + x[(2, 0)] * residuals[2];
        let s_b = x[(1, 0)] * residuals[1] + x[(3, 0)] * residuals[3];
        let expected = (s_a * s_a + s_b * s_b) / xtx[(0, 0)].powi(2) * 2.0;
        assert_relative_eq!(covariance[(0, 0)], expected, epsilon = 1e-12);
    }

    #[test]
    fn single_cluster_fails_clean() {
        let (x, residuals, xtx) = demeaned_fixture();
        let clusters = Grouping::from_labels(&["only", "only", "only", "only"]);
        let result = cluster_robust_covariance(&x, &residuals, &clusters, &xtx);
        assert!(matches!(
            result,
            Err(FeError::InsufficientClusters { found: 1 })
        ));
    }

    #[test]
    fn negative_diagonal_is_reported() {
        let covariance = DMatrix::from_column_slice(2, 2, &[1.0, 0.0, 0.0, -1e-9]);
        let result = standard_errors(&covariance);
        assert!(matches!(
            result,
            Err(FeError::NegativeVariance { index: 1, .. })
        ));
    }

    #[test]
    fn standard_errors_are_diagonal_roots() {
        let covariance = DMatrix::from_column_slice(2, 2, &[4.0, 0.5, 0.5, 9.0]);
        let errors = standard_errors(&covariance).unwrap();
        assert_relative_eq!(errors[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(errors[1], 3.0, epsilon = 1e-12);
    }
}
