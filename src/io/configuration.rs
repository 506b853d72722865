//! Aggregation constants and runtime configuration defaults

// Grid geometry
/// Default cell size in degrees (1°×1° gives a 180×360 grid)
pub const DEFAULT_RESOLUTION: f64 = 1.0;
/// Largest accepted cell size in degrees
pub const MAX_RESOLUTION: f64 = 180.0;
/// Allowed deviation of `180 / resolution` from an integer
pub const GRID_DIVISIBILITY_TOLERANCE: f64 = 1e-9;

// Upstream classifier
/// Default normalized intensity above which a pixel is classified as feature
pub const DEFAULT_THRESHOLD: f64 = 0.35;

// Scheduling
/// Default per-unit time budget in seconds (0 disables the budget)
pub const DEFAULT_UNIT_TIMEOUT_SECS: u64 = 600;
/// Rows accumulated between two cancellation checks
pub const CANCELLATION_CHECK_ROWS: usize = 64;
/// Prefix of worker thread names
pub const WORKER_THREAD_PREFIX: &str = "swath-worker";

// Input naming
/// Leading name field of classification rasters
pub const CLASSIFICATION_PREFIX: &str = "MOD021KM";
/// Marker that must follow the version field of a classification raster name
pub const CLASSIFICATION_MARKER: &str = "_RGB";
/// Extension of classification rasters
pub const CLASSIFICATION_EXTENSION: &str = "png";
/// Leading name field of geolocation rasters
pub const GEOLOCATION_PREFIX: &str = "MOD03";
/// Name suffix of latitude rasters
pub const LATITUDE_SUFFIX: &str = "_lat.tif";
/// Name suffix of longitude rasters
pub const LONGITUDE_SUFFIX: &str = "_lon.tif";

// Output layout
/// Directory for background count rasters
pub const BACKGROUND_DIR: &str = "count_0";
/// Directory for feature count rasters
pub const FEATURE_DIR: &str = "count_1";
/// Directory for ratio rasters
pub const RATIO_DIR: &str = "ratio";
/// Directory for run summaries
pub const SUMMARY_DIR: &str = "summary";
/// Directory for ratio previews
pub const PREVIEW_DIR: &str = "preview";
/// Directory for per-year mean ratio rasters
pub const YEARLY_DIR: &str = "yearavg";
/// Day counts of the per-year means, one `<year>: <days>` line each
pub const YEARLY_INFO_FILE: &str = "processing_info.txt";
/// Label used for outputs when no date filter is given
pub const DEFAULT_RUN_LABEL: &str = "all";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
