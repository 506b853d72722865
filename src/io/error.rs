//! Error types for grid aggregation runs and per-unit failures

use std::fmt;
use std::path::PathBuf;

/// Main error type for all aggregation operations
#[derive(Debug)]
pub enum AggregationError {
    /// Run configuration is invalid; raised before any work starts
    Configuration {
        /// Name of the offending setting
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// A work unit's source data could not be located or decoded
    UnitResolution {
        /// Identifier of the unit being resolved
        unit: String,
        /// Description of what could not be resolved
        reason: String,
    },

    /// Classification and coordinate arrays cannot be reconciled
    UnitShape {
        /// Shape of the classification array (rows, cols)
        classification: (usize, usize),
        /// Shape of the coordinate arrays (rows, cols)
        coordinates: (usize, usize),
        /// Description of the mismatch
        reason: String,
    },

    /// Coordinate resampling could not be computed
    Resample {
        /// Description of the failure
        reason: String,
    },

    /// A unit exceeded its processing time budget
    Timeout {
        /// Identifier of the unit that stalled
        unit: String,
        /// Time budget in milliseconds
        limit_ms: u128,
    },

    /// A unit was abandoned by the scheduler before it finished
    Cancelled {
        /// Number of rows processed before cancellation was observed
        rows_processed: usize,
    },

    /// Failed to load a classification raster
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to decode a floating point TIFF raster
    RasterDecode {
        /// Path to the TIFF file
        path: PathBuf,
        /// Underlying TIFF decoding error
        source: tiff::TiffError,
    },

    /// Failed to write a result raster
    Export {
        /// Path where export was attempted
        path: PathBuf,
        /// Description of the failure
        reason: String,
    },

    /// Failed to serialize a run report
    Serialization {
        /// Path where the report was being written
        path: PathBuf,
        /// Underlying serializer error
        source: serde_json::Error,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl AggregationError {
    /// Whether the error aborts the whole run rather than a single unit
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Reporting category used when the error is recorded as a unit failure
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::UnitShape { .. } | Self::Resample { .. } => FailureCategory::Shape,
            Self::Timeout { .. } | Self::Cancelled { .. } => FailureCategory::Timeout,
            Self::UnitResolution { .. }
            | Self::ImageLoad { .. }
            | Self::RasterDecode { .. }
            | Self::FileSystem { .. } => FailureCategory::Resolution,
            Self::Configuration { .. }
            | Self::Export { .. }
            | Self::Serialization { .. }
            | Self::Computation { .. } => FailureCategory::Internal,
        }
    }
}

/// Coarse classification of per-unit failures for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Source data missing, unreadable or undecodable
    Resolution,
    /// Array shapes could not be reconciled
    Shape,
    /// Unit stalled past its time budget
    Timeout,
    /// Worker panicked or produced an inconsistent result
    Internal,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resolution => "resolution",
            Self::Shape => "shape",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}

impl fmt::Display for AggregationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid configuration '{parameter}' = '{value}': {reason}")
            }
            Self::UnitResolution { unit, reason } => {
                write!(f, "Cannot resolve unit '{unit}': {reason}")
            }
            Self::UnitShape {
                classification,
                coordinates,
                reason,
            } => {
                write!(
                    f,
                    "Shape mismatch between classification {}x{} and coordinates {}x{}: {reason}",
                    classification.0, classification.1, coordinates.0, coordinates.1
                )
            }
            Self::Resample { reason } => {
                write!(f, "Coordinate resampling failed: {reason}")
            }
            Self::Timeout { unit, limit_ms } => {
                write!(f, "Unit '{unit}' exceeded its time budget of {limit_ms} ms")
            }
            Self::Cancelled { rows_processed } => {
                write!(f, "Unit cancelled after {rows_processed} rows")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::RasterDecode { path, source } => {
                write!(
                    f,
                    "Failed to decode raster '{}': {source}",
                    path.display()
                )
            }
            Self::Export { path, reason } => {
                write!(f, "Failed to export '{}': {reason}", path.display())
            }
            Self::Serialization { path, source } => {
                write!(f, "Failed to serialize '{}': {source}", path.display())
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for AggregationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } => Some(source),
            Self::RasterDecode { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for aggregation results
pub type Result<T> = std::result::Result<T, AggregationError>;

impl From<std::io::Error> for AggregationError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create a configuration error
pub fn invalid_configuration(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> AggregationError {
    AggregationError::Configuration {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a unit resolution error
pub fn unit_resolution(unit: &impl ToString, reason: &impl ToString) -> AggregationError {
    AggregationError::UnitResolution {
        unit: unit.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a unit shape error
pub fn unit_shape(
    classification: (usize, usize),
    coordinates: (usize, usize),
    reason: &impl ToString,
) -> AggregationError {
    AggregationError::UnitShape {
        classification,
        coordinates,
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> AggregationError {
    AggregationError::Computation {
        operation,
        reason: reason.to_string(),
    }
}
