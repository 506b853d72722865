/// Per-unit accumulation into partial grids
pub mod accumulator;
/// Run orchestration and configuration
pub mod executor;
/// Fold of per-unit results into the global grid
pub mod reducer;
/// Bounded worker pool with per-unit failure isolation
pub mod scheduler;
/// Work units, rasters and per-unit results
pub mod unit;
