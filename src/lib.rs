//! Parallel aggregation of classified satellite swaths into a global grid
//!
//! Each work unit pairs a binary classification raster with per-pixel
//! latitude and longitude arrays. Units are accumulated independently into
//! partial background/feature count grids on a bounded worker pool, summed
//! into one global grid, and turned into a per-cell feature ratio.

#![forbid(unsafe_code)]

/// Unit accumulation, scheduling, reduction and run orchestration
pub mod algorithm;
/// Mask classification, ratio derivation and run statistics
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Coordinate resampling
pub mod math;
/// Grid geometry and coordinate to cell mapping
pub mod spatial;

pub use io::error::{AggregationError, Result};
