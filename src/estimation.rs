//! High-level estimation pipeline: per-outcome sample selection, demeaning,
//! least squares, and clustered inference.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::data::PanelData;
use crate::demean::{sequential_demean, Grouping};
use crate::error::{FeError, Result};
use crate::ols::fit_ols;
use crate::variance::{cluster_robust_covariance, standard_errors};

/// Names the columns one regression uses: an outcome, one or more treatment
/// columns, the fixed-effect dimensions absorbed by demeaning, and the
/// dimension standard errors are clustered on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Specification {
    /// Numeric outcome column.
    pub outcome: String,
    /// Numeric treatment columns, in design-matrix order.
    pub treatments: Vec<String>,
    /// Categorical fixed-effect columns, demeaned in this order.
    pub fixed_effects: Vec<String>,
    /// Categorical cluster column.
    pub cluster: String,
}

impl Specification {
    /// A single-treatment specification (one design column).
    pub fn single(
        outcome: impl Into<String>,
        treatment: impl Into<String>,
        fixed_effects: Vec<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            outcome: outcome.into(),
            treatments: vec![treatment.into()],
            fixed_effects,
            cluster: cluster.into(),
        }
    }

    /// A treatment-plus-interaction specification (two design columns), where
    /// the caller supplies the precomputed treatment-times-moderator column.
    pub fn interaction(
        outcome: impl Into<String>,
        treatment: impl Into<String>,
        interaction: impl Into<String>,
        fixed_effects: Vec<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            outcome: outcome.into(),
            treatments: vec![treatment.into(), interaction.into()],
            fixed_effects,
            cluster: cluster.into(),
        }
    }
}

/// Result of estimating one specification on its complete-case sample.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Coefficient vector, one entry per treatment column.
    pub coefficients: DVector<f64>,
    /// Cluster-robust standard errors, aligned with `coefficients`.
    pub standard_errors: DVector<f64>,
    /// Unconditional mean of the outcome over the estimation sample.
    pub mean_outcome: f64,
    /// Number of observations used.
    pub n_obs: u64,
}

/// Outcome of one entry in a batch run: the specification together with its
/// estimate or the error that made it unavailable.
#[derive(Debug)]
pub struct SpecificationReport {
    pub spec: Specification,
    pub estimate: Result<RegressionResult>,
}

/// High-level wrapper binding an observation table to the estimator.
#[derive(Clone, Debug)]
pub struct PanelProblem {
    data: PanelData,
}

impl PanelProblem {
    /// Wraps a validated panel for estimation.
    pub fn new(data: PanelData) -> Self {
        Self { data }
    }

    /// Accessor for the underlying panel.
    pub fn data(&self) -> &PanelData {
        &self.data
    }

    /// Estimates one specification.
    ///
    /// Rows with a missing value in any column the specification names are
    /// dropped for this call only; the outcome mean and observation count are
    /// taken over the surviving sample before demeaning. An empty sample is
    /// reported as [`FeError::EmptySample`], an ordinary error value
    /// distinguishable from any estimated result.
    pub fn estimate(&self, spec: &Specification) -> Result<RegressionResult> {
        if spec.treatments.is_empty() {
            return Err(FeError::dimension_mismatch("treatment columns", 1, 0));
        }

        let outcome = self.data.numeric(&spec.outcome)?;
        let treatments: Vec<&[f64]> = spec
            .treatments
            .iter()
            .map(|name| self.data.numeric(name))
            .collect::<Result<_>>()?;
        let fixed_effects: Vec<&[Option<String>]> = spec
            .fixed_effects
            .iter()
            .map(|name| self.data.categorical(name))
            .collect::<Result<_>>()?;
        let cluster = self.data.categorical(&spec.cluster)?;

        // Complete-case restriction over exactly the columns in use.
        let kept: Vec<usize> = (0..self.data.len())
            .filter(|&row| {
                outcome[row].is_finite()
                    && treatments.iter().all(|column| column[row].is_finite())
                    && fixed_effects.iter().all(|column| column[row].is_some())
                    && cluster[row].is_some()
            })
            .collect();

        let n = kept.len();
        if n == 0 {
            return Err(FeError::EmptySample);
        }
        let k = treatments.len();

        let mut y = DVector::from_iterator(n, kept.iter().map(|&row| outcome[row]));
        let mut x = DMatrix::from_fn(n, k, |row, col| treatments[col][kept[row]]);

        let mean_outcome = y.mean();

        let groupings: Vec<Grouping> = fixed_effects
            .iter()
            .map(|column| gather_grouping(column, &kept))
            .collect();
        let clusters = gather_grouping(cluster, &kept);

        debug!(
            "estimating `{}`: n={}, k={}, fixed effects={}, clusters={}",
            spec.outcome,
            n,
            k,
            groupings.len(),
            clusters.group_count()
        );

        sequential_demean(&mut y, &mut x, &groupings)?;
        let fit = fit_ols(&x, &y)?;
        let covariance = cluster_robust_covariance(&x, &fit.residuals, &clusters, &fit.xtx)?;
        let errors = standard_errors(&covariance)?;

        Ok(RegressionResult {
            coefficients: fit.beta,
            standard_errors: errors,
            mean_outcome,
            n_obs: n as u64,
        })
    }

    /// Estimates every specification independently.
    ///
    /// A failure for one entry never aborts the others; each report carries
    /// either the estimate or the error that explains the missing cell.
    pub fn estimate_all(&self, specs: &[Specification]) -> Vec<SpecificationReport> {
        specs
            .iter()
            .map(|spec| {
                let estimate = self.estimate(spec);
                if let Err(error) = &estimate {
                    warn!("specification for `{}` unavailable: {}", spec.outcome, error);
                }
                SpecificationReport {
                    spec: spec.clone(),
                    estimate,
                }
            })
            .collect()
    }
}

/// Restricts a categorical column to the kept rows and encodes it as a
/// [`Grouping`]. Callers guarantee every kept label is present.
fn gather_grouping(column: &[Option<String>], kept: &[usize]) -> Grouping {
    let labels: Vec<&str> = kept
        .iter()
        .map(|&row| column[row].as_deref().unwrap_or_default())
        .collect();
    Grouping::from_labels(&labels)
}
