//! Work units, their decoded rasters, and per-unit results

use std::fmt;

use ndarray::Array2;
use serde::Serialize;

use crate::algorithm::accumulator::PartialGrid;
use crate::analysis::classify::BinaryMask;
use crate::io::error::{AggregationError, FailureCategory, Result, unit_shape};

/// One classification mask with its per-pixel coordinate arrays
///
/// Latitude and longitude always share a shape. The mask may differ from
/// them; the accumulator resamples the coordinates in that case.
#[derive(Debug, Clone)]
pub struct UnitRaster {
    mask: BinaryMask,
    latitude: Array2<f64>,
    longitude: Array2<f64>,
}

impl UnitRaster {
    /// Bundle a mask with its coordinate arrays
    ///
    /// # Errors
    ///
    /// Returns a shape error if latitude and longitude differ in shape
    pub fn new(mask: BinaryMask, latitude: Array2<f64>, longitude: Array2<f64>) -> Result<Self> {
        if latitude.dim() != longitude.dim() {
            return Err(unit_shape(
                latitude.dim(),
                longitude.dim(),
                &"latitude and longitude arrays differ in shape",
            ));
        }
        Ok(Self {
            mask,
            latitude,
            longitude,
        })
    }

    /// Classification mask
    pub const fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// Per-pixel latitudes in degrees
    pub const fn latitude(&self) -> &Array2<f64> {
        &self.latitude
    }

    /// Per-pixel longitudes in degrees
    pub const fn longitude(&self) -> &Array2<f64> {
        &self.longitude
    }
}

/// A reference to one unit of work, resolved inside a worker
///
/// Resolution may touch the file system and may fail; that failure is
/// confined to this unit.
pub trait UnitSource: Send {
    /// Stable human-readable identifier used in failure records
    fn identifier(&self) -> String;

    /// Resolve and decode the unit's arrays
    ///
    /// # Errors
    ///
    /// Returns an error if the source data cannot be located or decoded
    fn load(&self) -> Result<UnitRaster>;

    /// Release resources held by the source once the unit is finished
    ///
    /// Called exactly once on every exit path, including failures.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing fails; the scheduler logs it and keeps
    /// the unit's result
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A unit whose arrays are already decoded
#[derive(Debug, Clone)]
pub struct InMemoryUnit {
    identifier: String,
    raster: UnitRaster,
}

impl InMemoryUnit {
    /// Wrap a decoded raster under the given identifier
    pub fn new(identifier: impl Into<String>, raster: UnitRaster) -> Self {
        Self {
            identifier: identifier.into(),
            raster,
        }
    }

    /// Box the unit for submission to a scheduler
    pub fn boxed(self) -> Box<dyn UnitSource> {
        Box::new(self)
    }
}

impl UnitSource for InMemoryUnit {
    fn identifier(&self) -> String {
        self.identifier.clone()
    }

    fn load(&self) -> Result<UnitRaster> {
        Ok(self.raster.clone())
    }
}

/// Why a unit contributed nothing to the global grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    /// Identifier of the failed unit
    pub unit: String,
    /// Reporting category
    pub category: FailureCategory,
    /// Human-readable reason
    pub reason: String,
}

impl UnitFailure {
    /// Record an error raised while processing a unit
    pub fn from_error(unit: impl Into<String>, error: &AggregationError) -> Self {
        Self {
            unit: unit.into(),
            category: error.category(),
            reason: error.to_string(),
        }
    }

    /// Record a failure that has no underlying error value
    pub fn new(unit: impl Into<String>, category: FailureCategory, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            category,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.unit, self.category, self.reason)
    }
}

/// Outcome of processing exactly one unit
#[derive(Debug, Clone)]
pub enum WorkResult {
    /// The unit's pixels were accumulated
    Success {
        /// Identifier of the unit
        unit: String,
        /// Counts contributed by the unit
        partial: PartialGrid,
    },
    /// The unit contributed nothing
    Failure(UnitFailure),
}

impl WorkResult {
    /// Identifier of the unit this result belongs to
    pub fn unit(&self) -> &str {
        match self {
            Self::Success { unit, .. } => unit,
            Self::Failure(failure) => &failure.unit,
        }
    }

    /// Whether the unit was accumulated
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
