//! Classification of raw rasters and metrics derived from the global grid

/// Binary masks and threshold classification
pub mod classify;
/// Per-cell feature ratio
pub mod ratio;
/// Run-level summary statistics
pub mod summary;
/// Per-year means of daily ratio rasters
pub mod yearly;
