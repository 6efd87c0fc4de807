//! Observation-table container and validation utilities used by the estimator.

use std::collections::HashMap;

use crate::error::{FeError, Result};

/// A single named column of the panel.
///
/// Numeric columns carry outcomes, treatments, and interactions, with `NaN`
/// (or any non-finite value) marking a missing entry. Categorical columns
/// carry fixed-effect dimensions and cluster identifiers, with `None` marking
/// a missing label.
#[derive(Clone, Debug)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(labels) => labels.len(),
        }
    }
}

/// Represents the row-aligned observation table a regression runs against.
///
/// The table stores raw columns only; missing-value handling happens per
/// estimation call, so different outcomes may keep different effective
/// samples.
#[derive(Clone, Debug)]
pub struct PanelData {
    n_rows: usize,
    columns: HashMap<String, Column>,
}

impl PanelData {
    /// Starts a builder for a panel with `n_rows` observations.
    pub fn builder(n_rows: usize) -> PanelDataBuilder {
        PanelDataBuilder {
            n_rows,
            columns: HashMap::new(),
            error: None,
        }
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has zero rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Whether a column of any kind exists under `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the numeric column `name`, failing if it is absent or categorical.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.columns.get(name) {
            Some(Column::Numeric(values)) => Ok(values),
            Some(Column::Categorical(_)) => Err(FeError::ColumnType {
                name: name.to_string(),
                expected: "numeric",
            }),
            None => Err(FeError::missing_column(name)),
        }
    }

    /// Returns the categorical column `name`, failing if it is absent or numeric.
    pub fn categorical(&self, name: &str) -> Result<&[Option<String>]> {
        match self.columns.get(name) {
            Some(Column::Categorical(labels)) => Ok(labels),
            Some(Column::Numeric(_)) => Err(FeError::ColumnType {
                name: name.to_string(),
                expected: "categorical",
            }),
            None => Err(FeError::missing_column(name)),
        }
    }
}

/// Builder that validates column lengths and name uniqueness before
/// constructing [`PanelData`].
///
/// Validation errors are deferred to [`build`](PanelDataBuilder::build) so the
/// fluent chain stays uninterrupted; the first error wins.
#[derive(Debug)]
pub struct PanelDataBuilder {
    n_rows: usize,
    columns: HashMap<String, Column>,
    error: Option<FeError>,
}

impl PanelDataBuilder {
    /// Adds a numeric column. `NaN` entries are treated as missing values.
    pub fn numeric(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name.into(), Column::Numeric(values))
    }

    /// Adds a categorical column with no missing labels.
    pub fn categorical<S: Into<String>>(self, name: impl Into<String>, labels: Vec<S>) -> Self {
        let labels = labels.into_iter().map(|label| Some(label.into())).collect();
        self.insert(name.into(), Column::Categorical(labels))
    }

    /// Adds a categorical column where `None` marks a missing label.
    pub fn categorical_sparse(
        self,
        name: impl Into<String>,
        labels: Vec<Option<String>>,
    ) -> Self {
        self.insert(name.into(), Column::Categorical(labels))
    }

    /// Finalizes construction after validating shapes and name uniqueness.
    pub fn build(self) -> Result<PanelData> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(PanelData {
            n_rows: self.n_rows,
            columns: self.columns,
        })
    }

    fn insert(mut self, name: String, column: Column) -> Self {
        if self.error.is_some() {
            return self;
        }
        if column.len() != self.n_rows {
            self.error = Some(FeError::dimension_mismatch(
                "column length",
                self.n_rows,
                column.len(),
            ));
            return self;
        }
        if self.columns.contains_key(&name) {
            self.error = Some(FeError::DuplicateColumn { name });
            return self;
        }
        self.columns.insert(name, column);
        self
    }
}
