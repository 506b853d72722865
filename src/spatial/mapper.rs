//! Geographic coordinate to grid cell quantization
//!
//! Every finite coordinate with latitude in [-90, 90] and longitude in
//! [-180, 180] lands in exactly one cell. Bands are half-open `[k·res,
//! (k+1)·res)` except the last band of each axis, which also owns the closing
//! edge: +90° falls in row 0 and +180° in the last column, the same cells as
//! values just inside those edges.

use crate::spatial::grid::GridSpec;

/// Zero-based (row, col) position of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellIndex {
    /// Latitude band, 0 = northernmost
    pub row: usize,
    /// Longitude band, 0 = starting at 180°W
    pub col: usize,
}

/// Maps latitude/longitude pairs to cells of a fixed grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIndexMapper {
    spec: GridSpec,
}

impl GridIndexMapper {
    /// Create a mapper for the given grid
    pub const fn new(spec: GridSpec) -> Self {
        Self { spec }
    }

    /// Grid this mapper quantizes into
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Cell containing the coordinate, or `None` for NaN/out-of-range input
    #[inline]
    pub fn map(&self, lat: f64, lon: f64) -> Option<CellIndex> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }

        let res = self.spec.resolution();
        let lat_band = band(lat, res, self.spec.rows());
        let lon_band = band(lon, res, self.spec.cols());

        Some(CellIndex {
            row: self.spec.rows() - 1 - lat_band,
            col: lon_band,
        })
    }

    /// Row-major linear index of the cell containing the coordinate
    #[inline]
    pub fn linear_index(&self, lat: f64, lon: f64) -> Option<usize> {
        self.map(lat, lon)
            .map(|cell| cell.row * self.spec.cols() + cell.col)
    }
}

/// Band offset from the southern/western edge for an axis split into `bands`
///
/// With an even band count the axis origin is a band edge, so the offset is
/// `floor(value / res) + bands/2` exactly. An odd count (latitude at coarse
/// resolutions) has the origin mid-band and is shifted before flooring. The
/// closing edge is folded into the last band so the result always lies in
/// `[0, bands)`.
#[inline]
fn band(value: f64, res: f64, bands: usize) -> usize {
    let half = bands as f64 / 2.0;
    let offset = if bands % 2 == 0 {
        (value / res).floor() + half
    } else {
        (value / res + half).floor()
    };
    offset.clamp(0.0, (bands - 1) as f64) as usize
}
