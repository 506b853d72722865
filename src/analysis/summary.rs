//! Run-level statistics over the final grids

use serde::Serialize;

use crate::algorithm::reducer::GlobalGrid;
use crate::algorithm::unit::UnitFailure;
use crate::analysis::ratio::RatioMatrix;

/// Aggregate statistics of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Cell size in degrees
    pub resolution: f64,
    /// Number of cells in the grid
    pub total_cells: usize,
    /// Cells with at least one observation
    pub cells_with_data: usize,
    /// Sum of background counts
    pub background_total: u64,
    /// Sum of feature counts
    pub feature_total: u64,
    /// Sum of both counts
    pub observation_total: u64,
    /// Mean ratio over cells whose ratio is above zero
    pub mean_nonzero_ratio: f64,
    /// Largest cell ratio
    pub max_ratio: f64,
    /// Smallest cell ratio
    pub min_ratio: f64,
    /// Units folded into the grid
    pub successful_units: usize,
    /// Units that contributed nothing
    pub failed_units: usize,
    /// Pixels skipped for invalid coordinates in successful units
    pub rejected_pixels: u64,
}

impl RunSummary {
    /// Summarize a reduced grid, its ratios and the failure list
    pub fn new(grid: &GlobalGrid, ratio: &RatioMatrix, failures: &[UnitFailure]) -> Self {
        let counts = grid.counts();
        let values = ratio.values();

        let (nonzero_sum, nonzero_cells) = values
            .iter()
            .filter(|&&v| v > 0.0)
            .fold((0.0, 0_usize), |(sum, n), &v| (sum + v, n + 1));
        let mean_nonzero_ratio = if nonzero_cells > 0 {
            nonzero_sum / nonzero_cells as f64
        } else {
            0.0
        };

        let max_ratio = values.iter().copied().fold(0.0, f64::max);
        let min_ratio = values
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0);

        Self {
            resolution: grid.spec().resolution(),
            total_cells: grid.spec().cell_count(),
            cells_with_data: counts.cells_with_data(),
            background_total: counts.background_total(),
            feature_total: counts.feature_total(),
            observation_total: counts.observation_total(),
            mean_nonzero_ratio,
            max_ratio,
            min_ratio,
            successful_units: grid.successful_units(),
            failed_units: failures.len(),
            rejected_pixels: grid.rejected_pixels(),
        }
    }
}
