//! Fixed-effects panel regression with cluster-robust standard errors.
//!
//! This crate implements the estimator behind difference-in-differences style
//! tables: multi-way fixed effects absorbed by sequential demeaning, ordinary
//! least squares on the transformed data, and a cluster-robust ("sandwich")
//! covariance with the conventional `G/(G-1)` small-sample correction. It
//! offers tools to
//!
//! - hold a row-aligned observation table (`data` module),
//! - partition and demean by fixed-effect dimensions (`demean` module),
//! - fit the normal equations (`ols` module) and cluster the variance
//!   (`variance` module), and
//! - run per-outcome specifications end to end (`estimation` module).
//!
//! Each estimation call is a pure function of the panel and its
//! [`Specification`]: rows with missing values are dropped for that call
//! only, and failures are reported per specification so one broken column
//! never aborts a whole table.
//!
//! # A note on the within-transformation
//!
//! Demeaning makes exactly one pass per fixed-effect dimension, in the order
//! the specification lists them. This sequential scheme approximates the true
//! multi-way within-transformation and does not coincide with it when the
//! dimensions are neither nested nor orthogonal; alternating projections to
//! convergence would be more accurate but would change estimates relative to
//! the computation this crate reproduces.
//!
//! # Quick start
//!
//! ```
//! use panelfe::data::PanelData;
//! use panelfe::estimation::{PanelProblem, Specification};
//!
//! // Two firms, two periods; the treatment switches on within each firm.
//! let panel = PanelData::builder(4)
//!     .numeric("enforced", vec![1.0, 0.0, 1.0, 0.0])
//!     .numeric("treatment", vec![1.0, 0.0, 1.0, 0.0])
//!     .categorical("firm", vec!["f1", "f1", "f2", "f2"])
//!     .categorical("city", vec!["c1", "c2", "c1", "c2"])
//!     .build()
//!     .expect("validated panel");
//!
//! let problem = PanelProblem::new(panel);
//! let spec = Specification::single("enforced", "treatment", vec!["firm".into()], "city");
//!
//! let result = problem.estimate(&spec).expect("identified specification");
//! assert_eq!(result.n_obs, 4);
//! assert!((result.coefficients[0] - 1.0).abs() < 1e-12);
//! ```

pub mod data;
pub mod demean;
pub mod error;
pub mod estimation;
pub mod ols;
pub mod variance;

pub use data::{Column, PanelData, PanelDataBuilder};
pub use demean::{demean_in_place, sequential_demean, Grouping};
pub use error::{FeError, Result};
pub use estimation::{PanelProblem, RegressionResult, Specification, SpecificationReport};
