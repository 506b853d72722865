//! Per-cell feature ratio derived from the global counts

use ndarray::{Array2, Zip};

use crate::algorithm::reducer::GlobalGrid;

/// Feature fraction per cell, 0 where a cell has no observations
#[derive(Debug, Clone, PartialEq)]
pub struct RatioMatrix {
    values: Array2<f64>,
}

impl RatioMatrix {
    /// Compute `feature / (background + feature)` for every cell
    pub fn derive(grid: &GlobalGrid) -> Self {
        let values = Zip::from(grid.background())
            .and(grid.feature())
            .map_collect(|&background, &feature| ratio(background, feature));
        Self { values }
    }

    /// Ratio values as a matrix
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Ratio of one cell, if the index is in range
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get([row, col]).copied()
    }

    /// Matrix shape (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }
}

/// Feature fraction of a single cell with divide-by-zero guarding
#[inline]
pub fn ratio(background: u64, feature: u64) -> f64 {
    let total = background + feature;
    if total > 0 {
        feature as f64 / total as f64
    } else {
        0.0
    }
}
