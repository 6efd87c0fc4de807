use thiserror::Error;

/// Unified error type for `panelfe` operations.
#[derive(Debug, Error)]
pub enum FeError {
    /// Raised when provided columns, vectors, or matrices have incompatible lengths.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension, often implied by the rest of the data.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised when a column name is registered twice on the same builder.
    #[error("column `{name}` is already defined")]
    DuplicateColumn { name: String },

    /// Raised when a specification references a column the panel does not contain.
    #[error("column `{name}` not found in the panel")]
    MissingColumn { name: String },

    /// Raised when a column exists but has the wrong kind for its role.
    #[error("column `{name}` is not {expected}")]
    ColumnType {
        name: String,
        /// The kind the caller needed, e.g. `"numeric"`.
        expected: &'static str,
    },

    /// Raised when listwise deletion leaves zero usable rows for a specification.
    #[error("no observations remain after dropping rows with missing values")]
    EmptySample,

    /// Raised when the demeaned design matrix is rank-deficient and the
    /// requested coefficients cannot be identified.
    #[error("design matrix in {context} is singular or rank-deficient")]
    SingularDesign { context: &'static str },

    /// Raised when the estimation sample contains fewer than two distinct
    /// clusters, leaving the cluster-robust variance undefined.
    #[error("cluster-robust variance requires at least 2 clusters, found {found}")]
    InsufficientClusters { found: usize },

    /// Raised when a variance diagonal entry comes out negative due to
    /// numerical cancellation; signals a modeling or data problem.
    #[error("variance of coefficient {index} is negative ({value}); numerical cancellation")]
    NegativeVariance { index: usize, value: f64 },
}

impl FeError {
    /// Helper to format a [`DimensionMismatch`](FeError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper to raise when a factorization or rank check finds a singular design.
    pub fn singular(context: &'static str) -> Self {
        Self::SingularDesign { context }
    }

    /// Helper for columns a specification names but the panel lacks.
    pub fn missing_column(name: impl Into<String>) -> Self {
        Self::MissingColumn { name: name.into() }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, FeError>;
