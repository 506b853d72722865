//! Spatial data structures for the global grid
//!
//! This module contains spatial-related functionality including:
//! - Grid geometry and count matrices
//! - Coordinate to cell quantization

/// Grid geometry and paired count matrices
pub mod grid;
/// Latitude/longitude to cell index mapping
pub mod mapper;

pub use grid::{CountGrid, GridSpec};
pub use mapper::{CellIndex, GridIndexMapper};
