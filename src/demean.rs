//! Group partitions and the sequential within-transformation.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::error::{FeError, Result};

/// A partition of the estimation sample into groups, encoded as dense codes.
///
/// Every row belongs to exactly one group; groups need not be of equal size.
/// The same structure serves both fixed-effect dimensions (for demeaning) and
/// the cluster dimension (for variance estimation).
#[derive(Clone, Debug)]
pub struct Grouping {
    codes: Vec<usize>,
    group_count: usize,
}

impl Grouping {
    /// Builds a partition from row-aligned labels, assigning dense codes in
    /// first-appearance order.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut codes = Vec::with_capacity(labels.len());
        for label in labels {
            let next = index.len();
            let code = *index.entry(label.as_ref()).or_insert(next);
            codes.push(code);
        }
        Self {
            group_count: index.len(),
            codes,
        }
    }

    /// Number of rows covered by the partition.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the partition covers zero rows.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Number of distinct groups.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Dense group code for each row.
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }
}

/// Subtracts each group's mean of the current values from `y` and from every
/// column of `x`, for the rows of that group.
///
/// Only mean subtraction occurs, so no division hazard exists: every group has
/// at least one row by construction, and a size-1 group demeans its row to
/// exactly zero.
pub fn demean_in_place(
    y: &mut DVector<f64>,
    x: &mut DMatrix<f64>,
    grouping: &Grouping,
) -> Result<()> {
    let n = y.len();
    if grouping.len() != n {
        return Err(FeError::dimension_mismatch(
            "grouping length",
            n,
            grouping.len(),
        ));
    }
    if x.nrows() != n {
        return Err(FeError::dimension_mismatch("design rows", n, x.nrows()));
    }

    let g = grouping.group_count();
    let codes = grouping.codes();

    let mut counts = vec![0usize; g];
    for &code in codes {
        counts[code] += 1;
    }

    let mut sums = vec![0.0f64; g];
    for (row, &code) in codes.iter().enumerate() {
        sums[code] += y[row];
    }
    for (row, &code) in codes.iter().enumerate() {
        y[row] -= sums[code] / counts[code] as f64;
    }

    for col in 0..x.ncols() {
        sums.iter_mut().for_each(|sum| *sum = 0.0);
        for (row, &code) in codes.iter().enumerate() {
            sums[code] += x[(row, col)];
        }
        for (row, &code) in codes.iter().enumerate() {
            x[(row, col)] -= sums[code] / counts[code] as f64;
        }
    }

    Ok(())
}

/// Applies [`demean_in_place`] once per grouping, in caller order.
///
/// This is the sequential approximation to multi-way within-transformation:
/// exactly one pass per fixed-effect dimension, never iterated back and forth
/// until convergence. When the dimensions are neither nested nor orthogonal a
/// later pass can reintroduce nonzero means under an earlier partition; that
/// behavior is intentional and must be preserved for reproducibility, even
/// though alternating projections to convergence would be more accurate.
pub fn sequential_demean(
    y: &mut DVector<f64>,
    x: &mut DMatrix<f64>,
    groupings: &[Grouping],
) -> Result<()> {
    for grouping in groupings {
        demean_in_place(y, x, grouping)?;
    }
    Ok(())
}
