//! Binary classification masks and the intensity threshold classifier

use image::GrayImage;
use ndarray::{Array2, ArrayView2};

use crate::io::error::{AggregationError, Result, invalid_configuration};

/// Two-class pixel mask with values restricted to {0, 1}
///
/// 0 marks background, 1 marks feature. The restriction is enforced at
/// construction so consumers never see any other value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    values: Array2<u8>,
}

impl BinaryMask {
    /// Wrap an array of class values
    ///
    /// # Errors
    ///
    /// Returns a computation error if any value is outside {0, 1}
    pub fn from_values(values: Array2<u8>) -> Result<Self> {
        if let Some(((row, col), value)) = values.indexed_iter().find(|(_, v)| **v > 1) {
            return Err(AggregationError::Computation {
                operation: "binary mask",
                reason: format!("value {value} at ({row}, {col}) is not a class in {{0, 1}}"),
            });
        }
        Ok(Self { values })
    }

    /// Mask with every pixel set to the same class
    pub fn filled(shape: (usize, usize), feature: bool) -> Self {
        Self {
            values: Array2::from_elem(shape, u8::from(feature)),
        }
    }

    /// Class values as a view
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.values.view()
    }

    /// Mask shape (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Number of feature pixels
    pub fn feature_pixels(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1).count()
    }
}

/// Threshold an 8-bit intensity image into a [`BinaryMask`]
///
/// A pixel is feature when `value / 255 > threshold`.
///
/// # Errors
///
/// Returns a configuration error if the threshold is not within [0, 1]
pub fn classify_threshold(image: &GrayImage, threshold: f64) -> Result<BinaryMask> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(invalid_configuration(
            "threshold",
            &threshold,
            &"must lie within [0, 1]",
        ));
    }

    let (width, height) = image.dimensions();
    let mut values = Array2::zeros((height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        if let Some(value) = values.get_mut([y as usize, x as usize]) {
            *value = u8::from(f64::from(pixel.0[0]) / 255.0 > threshold);
        }
    }
    Ok(BinaryMask { values })
}
