//! Per-unit accumulation of classified pixels into a partial grid
//!
//! Each pixel is turned into a histogram slot `2 * cell + class` in a single
//! pass; rejected pixels go to one trailing discard slot. The histogram is then
//! split into the background and feature matrices. No state outside the call
//! is touched.

use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array2, Zip};

use crate::algorithm::unit::UnitRaster;
use crate::io::configuration::CANCELLATION_CHECK_ROWS;
use crate::io::error::{AggregationError, Result, computation_error, unit_shape};
use crate::math::resample::CoordinateResampler;
use crate::spatial::grid::{CountGrid, GridSpec};
use crate::spatial::mapper::GridIndexMapper;

/// Counts contributed by a single unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialGrid {
    counts: CountGrid,
    rejected_pixels: u64,
}

impl PartialGrid {
    /// Wrap counts produced outside a [`UnitAccumulator`]
    pub const fn from_counts(counts: CountGrid, rejected_pixels: u64) -> Self {
        Self {
            counts,
            rejected_pixels,
        }
    }

    /// Background and feature counts
    pub const fn counts(&self) -> &CountGrid {
        &self.counts
    }

    /// Pixels that landed in a cell
    pub fn valid_pixels(&self) -> u64 {
        self.counts.observation_total()
    }

    /// Pixels skipped because their coordinate was NaN or out of range
    pub const fn rejected_pixels(&self) -> u64 {
        self.rejected_pixels
    }
}

/// Turns one unit raster into a [`PartialGrid`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitAccumulator {
    mapper: GridIndexMapper,
}

impl UnitAccumulator {
    /// Create an accumulator for the given grid
    pub const fn new(spec: GridSpec) -> Self {
        Self {
            mapper: GridIndexMapper::new(spec),
        }
    }

    /// Grid the accumulator fills
    pub const fn spec(&self) -> &GridSpec {
        self.mapper.spec()
    }

    /// Accumulate every pixel of the raster
    ///
    /// # Errors
    ///
    /// Returns a shape or resample error if the coordinates cannot be
    /// reconciled with the mask
    pub fn accumulate(&self, raster: &UnitRaster) -> Result<PartialGrid> {
        self.accumulate_until(raster, &AtomicBool::new(false))
    }

    /// Accumulate every pixel, stopping early once `cancel` is raised
    ///
    /// The flag is polled every [`CANCELLATION_CHECK_ROWS`] rows.
    ///
    /// # Errors
    ///
    /// Returns a shape or resample error if the coordinates cannot be
    /// reconciled with the mask, or a cancellation error if `cancel` was
    /// observed before the last row
    pub fn accumulate_until(&self, raster: &UnitRaster, cancel: &AtomicBool) -> Result<PartialGrid> {
        let mask = raster.mask().view();
        let target = mask.dim();
        if target.0 == 0 || target.1 == 0 {
            return Err(unit_shape(
                target,
                raster.latitude().dim(),
                &"classification array is empty",
            ));
        }

        let (latitude, longitude) = CoordinateResampler::reconcile(
            raster.latitude().view(),
            raster.longitude().view(),
            target,
        )?;

        let cells = self.spec().cell_count();
        let discard = 2 * cells;
        let mut bins = vec![0_u64; discard + 1];

        let rows = mask
            .rows()
            .into_iter()
            .zip(latitude.rows())
            .zip(longitude.rows());
        for (row_index, ((class_row, lat_row), lon_row)) in rows.enumerate() {
            if row_index % CANCELLATION_CHECK_ROWS == 0 && cancel.load(Ordering::Relaxed) {
                return Err(AggregationError::Cancelled {
                    rows_processed: row_index,
                });
            }

            Zip::from(&class_row)
                .and(&lat_row)
                .and(&lon_row)
                .for_each(|&class, &lat, &lon| {
                    let slot = self
                        .mapper
                        .linear_index(lat, lon)
                        .map_or(discard, |cell| 2 * cell + usize::from(class));
                    if let Some(bin) = bins.get_mut(slot) {
                        *bin += 1;
                    }
                });
        }

        let rejected_pixels = bins.pop().unwrap_or(0);
        let (background, feature): (Vec<u64>, Vec<u64>) = bins
            .chunks_exact(2)
            .map(|pair| match pair {
                [b, f] => (*b, *f),
                _ => (0, 0),
            })
            .unzip();

        let shape = self.spec().shape();
        let background = Array2::from_shape_vec(shape, background)
            .map_err(|e| computation_error("partial grid layout", &e))?;
        let feature = Array2::from_shape_vec(shape, feature)
            .map_err(|e| computation_error("partial grid layout", &e))?;

        Ok(PartialGrid {
            counts: CountGrid::from_parts(background, feature)?,
            rejected_pixels,
        })
    }
}
