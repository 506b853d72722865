//! Global equirectangular grid geometry and count matrices
//!
//! A grid of resolution `res` degrees has `180 / res` rows and `360 / res`
//! columns. Row 0 is the northernmost band and column 0 the band starting at
//! 180°W. Both count matrices share that shape for the lifetime of a run.

use ndarray::{Array2, Zip};

use crate::io::configuration::{GRID_DIVISIBILITY_TOLERANCE, MAX_RESOLUTION};
use crate::io::error::{Result, invalid_configuration, unit_shape};

/// Shape and cell size of a global plate carrée grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    resolution: f64,
    rows: usize,
    cols: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            rows: 180,
            cols: 360,
        }
    }
}

impl GridSpec {
    /// Create a grid specification for the given cell size in degrees
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the resolution is not finite, not
    /// positive, larger than 180°, or does not divide 180° evenly
    pub fn new(resolution: f64) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(invalid_configuration(
                "resolution",
                &resolution,
                &"must be a finite positive number of degrees",
            ));
        }
        if resolution > MAX_RESOLUTION {
            return Err(invalid_configuration(
                "resolution",
                &resolution,
                &format!("must not exceed {MAX_RESOLUTION} degrees"),
            ));
        }

        let bands = 180.0 / resolution;
        let rounded = bands.round();
        if (bands - rounded).abs() > GRID_DIVISIBILITY_TOLERANCE * bands.max(1.0) {
            return Err(invalid_configuration(
                "resolution",
                &resolution,
                &"180 degrees must be an integer multiple of the resolution",
            ));
        }

        let rows = rounded as usize;
        Ok(Self {
            resolution,
            rows,
            cols: rows * 2,
        })
    }

    /// Cell size in degrees
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Number of latitude bands (R)
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of longitude bands (C)
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Matrix shape (R, C)
    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells (R × C)
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Geographic center (lat, lon) of a cell
    ///
    /// `lat = 90 - res/2 - row*res`, `lon = col*res - 180 + res/2`
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let half = self.resolution / 2.0;
        let lat = 90.0 - half - row as f64 * self.resolution;
        let lon = (col as f64).mul_add(self.resolution, -180.0) + half;
        (lat, lon)
    }
}

/// Paired background/feature count matrices over a [`GridSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountGrid {
    background: Array2<u64>,
    feature: Array2<u64>,
}

impl CountGrid {
    /// Create zero-filled matrices for the given grid
    pub fn zeros(spec: &GridSpec) -> Self {
        Self {
            background: Array2::zeros(spec.shape()),
            feature: Array2::zeros(spec.shape()),
        }
    }

    /// Build from existing matrices
    ///
    /// # Errors
    ///
    /// Returns a shape error if the two matrices differ in shape
    pub fn from_parts(background: Array2<u64>, feature: Array2<u64>) -> Result<Self> {
        if background.dim() != feature.dim() {
            return Err(unit_shape(
                background.dim(),
                feature.dim(),
                &"background and feature matrices must share a shape",
            ));
        }
        Ok(Self {
            background,
            feature,
        })
    }

    /// Background (class 0) counts
    pub const fn background(&self) -> &Array2<u64> {
        &self.background
    }

    /// Feature (class 1) counts
    pub const fn feature(&self) -> &Array2<u64> {
        &self.feature
    }

    /// Matrix shape (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.background.dim()
    }

    /// Counts (background, feature) of one cell, if the index is in range
    pub fn cell(&self, row: usize, col: usize) -> Option<(u64, u64)> {
        let background = self.background.get([row, col])?;
        let feature = self.feature.get([row, col])?;
        Some((*background, *feature))
    }

    /// Element-wise addition of another grid of the same shape
    ///
    /// # Errors
    ///
    /// Returns a shape error if the grids differ in shape
    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        if self.dim() != other.dim() {
            return Err(unit_shape(
                self.dim(),
                other.dim(),
                &"partial grid does not match the global grid",
            ));
        }
        Zip::from(&mut self.background)
            .and(&other.background)
            .for_each(|total, &count| *total += count);
        Zip::from(&mut self.feature)
            .and(&other.feature)
            .for_each(|total, &count| *total += count);
        Ok(())
    }

    /// Sum of all background counts
    pub fn background_total(&self) -> u64 {
        self.background.sum()
    }

    /// Sum of all feature counts
    pub fn feature_total(&self) -> u64 {
        self.feature.sum()
    }

    /// Sum of both matrices
    pub fn observation_total(&self) -> u64 {
        self.background_total() + self.feature_total()
    }

    /// Number of cells with at least one observation
    pub fn cells_with_data(&self) -> usize {
        Zip::from(&self.background)
            .and(&self.feature)
            .fold(0, |acc, &b, &f| if b + f > 0 { acc + 1 } else { acc })
    }
}
