//! Input/output: command line, unit discovery, export and error handling

/// Command-line interface and batch orchestration
pub mod cli;
/// Aggregation constants and defaults
pub mod configuration;
/// Error types and failure categories
pub mod error;
/// GeoTIFF, JSON and PNG result export
pub mod export;
/// Progress display for unit batches
pub mod progress;
/// File-backed work units
pub mod source;
