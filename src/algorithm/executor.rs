//! Run orchestration: validate, schedule, reduce, derive

use std::time::{Duration, Instant};

use log::info;

use crate::algorithm::accumulator::UnitAccumulator;
use crate::algorithm::reducer::{GlobalGrid, Reducer};
use crate::algorithm::scheduler::WorkScheduler;
use crate::algorithm::unit::{UnitFailure, UnitSource, WorkResult};
use crate::analysis::ratio::RatioMatrix;
use crate::analysis::summary::RunSummary;
use crate::io::configuration::{DEFAULT_RESOLUTION, DEFAULT_UNIT_TIMEOUT_SECS};
use crate::io::error::{Result, invalid_configuration};
use crate::spatial::grid::GridSpec;

/// Run parameters fixed before any unit is dispatched
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregationConfig {
    /// Cell size in degrees; must divide 180 evenly
    pub resolution: f64,
    /// Number of concurrent workers
    pub workers: usize,
    /// Per-unit time budget, `None` to wait indefinitely
    pub unit_timeout: Option<Duration>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            workers: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            unit_timeout: Some(Duration::from_secs(DEFAULT_UNIT_TIMEOUT_SECS)),
        }
    }
}

impl AggregationConfig {
    /// Check every parameter and derive the grid geometry
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid resolution, a zero worker
    /// count or a zero time budget
    pub fn validate(&self) -> Result<(GridSpec, WorkScheduler)> {
        let spec = GridSpec::new(self.resolution)?;
        let scheduler = WorkScheduler::new(self.workers, self.unit_timeout)?;
        Ok((spec, scheduler))
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Summed background and feature counts
    pub grid: GlobalGrid,
    /// Per-cell feature ratio
    pub ratio: RatioMatrix,
    /// Units that contributed nothing, in submission order
    pub failures: Vec<UnitFailure>,
    /// Run-level statistics
    pub summary: RunSummary,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Runs a batch of units end to end
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    spec: GridSpec,
    scheduler: WorkScheduler,
}

impl Aggregator {
    /// Validate the configuration and prepare a run
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any parameter is invalid
    pub fn new(config: AggregationConfig) -> Result<Self> {
        let (spec, scheduler) = config.validate()?;
        Ok(Self { spec, scheduler })
    }

    /// Grid the run fills
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Scheduler used for the run
    pub const fn scheduler(&self) -> &WorkScheduler {
        &self.scheduler
    }

    /// Process all units and derive the ratio matrix
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `units` is empty or the worker pool
    /// cannot be built. Failing units are reported in
    /// [`RunOutcome::failures`] instead.
    pub fn run(&self, units: Vec<Box<dyn UnitSource>>) -> Result<RunOutcome> {
        self.run_with_observer(units, |_, _| {})
    }

    /// Like [`Aggregator::run`], calling `observer` as each unit is resolved
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `units` is empty or the worker pool
    /// cannot be built
    pub fn run_with_observer<F>(&self, units: Vec<Box<dyn UnitSource>>, observer: F) -> Result<RunOutcome>
    where
        F: FnMut(usize, &WorkResult),
    {
        if units.is_empty() {
            return Err(invalid_configuration(
                "units",
                &0,
                &"at least one work unit is required",
            ));
        }

        let start = Instant::now();
        info!(
            "Aggregating {} units into a {}x{} grid at {}°",
            units.len(),
            self.spec.rows(),
            self.spec.cols(),
            self.spec.resolution()
        );

        let accumulator = UnitAccumulator::new(self.spec);
        let results = self
            .scheduler
            .run_with_observer(units, accumulator, observer)?;

        let mut reducer = Reducer::new(self.spec);
        reducer.fold_all(results);
        let reduction = reducer.finish();

        let ratio = RatioMatrix::derive(&reduction.grid);
        let summary = RunSummary::new(&reduction.grid, &ratio, &reduction.failures);
        let elapsed = start.elapsed();

        info!(
            "Run finished in {elapsed:.2?}: {} units succeeded, {} failed, {} observations in {} cells",
            summary.successful_units,
            summary.failed_units,
            summary.observation_total,
            summary.cells_with_data
        );

        Ok(RunOutcome {
            grid: reduction.grid,
            ratio,
            failures: reduction.failures,
            summary,
            elapsed,
        })
    }
}
