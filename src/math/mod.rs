//! Numerical utilities for coordinate handling

/// Bilinear zoom resampling of coordinate arrays
pub mod resample;
