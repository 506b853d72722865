//! Per-year mean of daily ratio rasters
//!
//! Daily ratio rasters are named `ratio_<YYYYDDD>.tif`. For each year the
//! per-cell values are summed, skipping NaN samples, and divided by the
//! number of daily rasters of that year.

use std::collections::BTreeMap;

use ndarray::{Array2, Zip};

use crate::io::configuration::RATIO_DIR;
use crate::io::error::{Result, computation_error};

/// Running sum of one year's daily ratios
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyMean {
    year: u16,
    days: usize,
    sum: Array2<f64>,
}

impl YearlyMean {
    /// Start an empty year with the given raster shape
    pub fn new(year: u16, shape: (usize, usize)) -> Self {
        Self {
            year,
            days: 0,
            sum: Array2::zeros(shape),
        }
    }

    /// Add one daily raster; NaN samples contribute nothing but the day still counts
    ///
    /// # Errors
    ///
    /// Returns a computation error if the raster shape differs from the year's
    pub fn add(&mut self, daily: &Array2<f64>) -> Result<()> {
        if daily.dim() != self.sum.dim() {
            return Err(computation_error(
                "yearly mean",
                &format!(
                    "daily raster of {} is {}x{}, expected {}x{}",
                    self.year,
                    daily.dim().0,
                    daily.dim().1,
                    self.sum.dim().0,
                    self.sum.dim().1
                ),
            ));
        }

        Zip::from(&mut self.sum).and(daily).for_each(|sum, &value| {
            if !value.is_nan() {
                *sum += value;
            }
        });
        self.days += 1;
        Ok(())
    }

    /// Calendar year
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Number of daily rasters added
    pub const fn days(&self) -> usize {
        self.days
    }

    /// Raster shape (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.sum.dim()
    }

    /// Per-cell mean over the added days, zero before any day was added
    pub fn mean(&self) -> Array2<f64> {
        if self.days == 0 {
            return Array2::zeros(self.sum.dim());
        }
        let days = self.days as f64;
        self.sum.mapv(|sum| sum / days)
    }
}

/// Groups daily rasters by year
#[derive(Debug, Default)]
pub struct YearlyAverager {
    years: BTreeMap<u16, YearlyMean>,
}

impl YearlyAverager {
    /// Create an averager with no years
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a daily raster to its year; the first raster of a year fixes its shape
    ///
    /// # Errors
    ///
    /// Returns a computation error if the raster shape differs from earlier
    /// rasters of the same year
    pub fn add(&mut self, year: u16, daily: &Array2<f64>) -> Result<()> {
        self.years
            .entry(year)
            .or_insert_with(|| YearlyMean::new(year, daily.dim()))
            .add(daily)
    }

    /// Years in ascending order
    pub fn finish(self) -> Vec<YearlyMean> {
        self.years.into_values().collect()
    }
}

/// Year of a daily ratio raster name (`ratio_<YYYYDDD>.tif`)
///
/// Returns `None` for any other name, including run-wide rasters such as
/// `ratio_all.tif`.
pub fn daily_ratio_year(name: &str) -> Option<u16> {
    let date = name
        .strip_prefix(RATIO_DIR)?
        .strip_prefix('_')?
        .strip_suffix(".tif")?;
    if date.len() != 7 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    date.get(..4)?.parse().ok()
}
