//! Commutative fold of per-unit results into the global grid

use log::warn;
use ndarray::Array2;

use crate::algorithm::unit::{UnitFailure, WorkResult};
use crate::io::error::FailureCategory;
use crate::spatial::grid::{CountGrid, GridSpec};

/// Run-wide counts after every result has been folded in
///
/// Only read access is exposed; the counts cannot change once a
/// [`Reducer`] has produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalGrid {
    spec: GridSpec,
    counts: CountGrid,
    successful_units: usize,
    rejected_pixels: u64,
}

impl GlobalGrid {
    /// Grid geometry
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Background and feature counts
    pub const fn counts(&self) -> &CountGrid {
        &self.counts
    }

    /// Background (class 0) counts
    pub const fn background(&self) -> &Array2<u64> {
        self.counts.background()
    }

    /// Feature (class 1) counts
    pub const fn feature(&self) -> &Array2<u64> {
        self.counts.feature()
    }

    /// Number of units whose counts were folded in
    pub const fn successful_units(&self) -> usize {
        self.successful_units
    }

    /// Pixels that landed in a cell across all successful units
    pub fn valid_pixels(&self) -> u64 {
        self.counts.observation_total()
    }

    /// Pixels rejected by the mapper across all successful units
    pub const fn rejected_pixels(&self) -> u64 {
        self.rejected_pixels
    }

    /// Geographic center (lat, lon) of a cell
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.spec.cell_center(row, col)
    }
}

/// Result of folding a batch of work results
#[derive(Debug, Clone)]
pub struct Reduction {
    /// Sum of all successful partial grids
    pub grid: GlobalGrid,
    /// Failed units in the order they were folded
    pub failures: Vec<UnitFailure>,
}

/// Owns the global counts while results are folded in
#[derive(Debug)]
pub struct Reducer {
    spec: GridSpec,
    counts: CountGrid,
    successful_units: usize,
    rejected_pixels: u64,
    failures: Vec<UnitFailure>,
}

impl Reducer {
    /// Start from zero-filled counts
    pub fn new(spec: GridSpec) -> Self {
        Self {
            spec,
            counts: CountGrid::zeros(&spec),
            successful_units: 0,
            rejected_pixels: 0,
            failures: Vec::new(),
        }
    }

    /// Fold one result
    ///
    /// A success whose partial grid does not match the global shape is
    /// recorded as an internal failure rather than aborting the fold.
    pub fn fold(&mut self, result: WorkResult) {
        match result {
            WorkResult::Success { unit, partial } => {
                match self.counts.add_assign(partial.counts()) {
                    Ok(()) => {
                        self.successful_units += 1;
                        self.rejected_pixels += partial.rejected_pixels();
                    }
                    Err(error) => {
                        warn!("Discarding counts of {unit}: {error}");
                        self.failures.push(UnitFailure::new(
                            unit,
                            FailureCategory::Internal,
                            error.to_string(),
                        ));
                    }
                }
            }
            WorkResult::Failure(failure) => self.failures.push(failure),
        }
    }

    /// Fold every result of an iterator
    pub fn fold_all(&mut self, results: impl IntoIterator<Item = WorkResult>) {
        for result in results {
            self.fold(result);
        }
    }

    /// Freeze the counts
    pub fn finish(self) -> Reduction {
        Reduction {
            grid: GlobalGrid {
                spec: self.spec,
                counts: self.counts,
                successful_units: self.successful_units,
                rejected_pixels: self.rejected_pixels,
            },
            failures: self.failures,
        }
    }
}

/// Fold a complete batch of results into a global grid
pub fn reduce(spec: GridSpec, results: impl IntoIterator<Item = WorkResult>) -> Reduction {
    let mut reducer = Reducer::new(spec);
    reducer.fold_all(results);
    reducer.finish()
}
