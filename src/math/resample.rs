//! Order-1 (bilinear) zoom resampling of coordinate arrays
//!
//! Output samples are placed corner-aligned on the input grid: output index
//! `o` of an axis with `n_out` samples reads input position
//! `o * (n_in - 1) / (n_out - 1)`, and a single-sample output axis reads
//! position 0. This is the sample placement of a classic spline zoom with
//! order 1, so a resample of an unchanged shape is the identity.

use ndarray::{Array2, ArrayView2, CowArray, Ix2};
use num_traits::Float;

use crate::io::error::{AggregationError, Result, unit_shape};

/// Interpolation taps for one output sample along one axis
#[derive(Debug, Clone, Copy)]
struct Tap<T> {
    lower: usize,
    upper: usize,
    weight: T,
}

fn axis_taps<T: Float>(input: usize, output: usize) -> Vec<Tap<T>> {
    if input == 1 || output == 1 {
        return vec![
            Tap {
                lower: 0,
                upper: 0,
                weight: T::zero(),
            };
            output
        ];
    }

    let scale = (input - 1) as f64 / (output - 1) as f64;
    (0..output)
        .map(|o| {
            let position = o as f64 * scale;
            let lower = (position.floor() as usize).min(input - 1);
            let upper = (lower + 1).min(input - 1);
            let weight = T::from(position - lower as f64).unwrap_or_else(T::zero);
            Tap {
                lower,
                upper,
                weight,
            }
        })
        .collect()
}

/// Linear blend of two neighbours; NaN in either one yields NaN
#[inline]
fn lerp<T: Float>(a: T, b: T, weight: T) -> T {
    (b - a).mul_add(weight, a)
}

fn validate_shapes(input: (usize, usize), output: (usize, usize)) -> Result<()> {
    if input.0 == 0 || input.1 == 0 {
        return Err(AggregationError::Resample {
            reason: format!("input array is empty ({}x{})", input.0, input.1),
        });
    }
    if output.0 == 0 || output.1 == 0 {
        return Err(AggregationError::Resample {
            reason: format!("target shape is empty ({}x{})", output.0, output.1),
        });
    }
    Ok(())
}

/// Resample with a custom combination of the four neighbouring samples
///
/// `combine` receives `[top_left, top_right, bottom_left, bottom_right]`, the
/// row weight and the column weight.
fn resample_with<T, F>(input: &ArrayView2<'_, T>, shape: (usize, usize), combine: F) -> Result<Array2<T>>
where
    T: Float,
    F: Fn([T; 4], T, T) -> T,
{
    validate_shapes(input.dim(), shape)?;

    let (in_rows, in_cols) = input.dim();
    let row_taps = axis_taps::<T>(in_rows, shape.0);
    let col_taps = axis_taps::<T>(in_cols, shape.1);

    let sample = |r: usize, c: usize| input.get([r, c]).copied().unwrap_or_else(T::nan);

    let mut output = Array2::from_elem(shape, T::nan());
    for (row_tap, mut out_row) in row_taps.iter().zip(output.rows_mut()) {
        for (col_tap, out) in col_taps.iter().zip(out_row.iter_mut()) {
            let corners = [
                sample(row_tap.lower, col_tap.lower),
                sample(row_tap.lower, col_tap.upper),
                sample(row_tap.upper, col_tap.lower),
                sample(row_tap.upper, col_tap.upper),
            ];
            *out = combine(corners, row_tap.weight, col_tap.weight);
        }
    }
    Ok(output)
}

/// Bilinear zoom of a 2-D array to the given shape
///
/// A NaN sample turns every output whose interpolation taps include it into
/// NaN, including outputs that sit exactly on its neighbour.
///
/// # Errors
///
/// Returns a resample error if the input or the target shape is empty
pub fn resample_linear<T: Float>(input: &ArrayView2<'_, T>, shape: (usize, usize)) -> Result<Array2<T>> {
    resample_with(input, shape, |[tl, tr, bl, br], wr, wc| {
        lerp(lerp(tl, tr, wc), lerp(bl, br, wc), wr)
    })
}

/// Bilinear zoom of longitudes that interpolates across the antimeridian
///
/// Neighbours are unwrapped relative to the top-left sample before
/// interpolation and the result is wrapped back into [-180, 180], so samples
/// at 179.9° and -179.9° interpolate to ±180° instead of 0°.
///
/// # Errors
///
/// Returns a resample error if the input or the target shape is empty
pub fn resample_longitude<T: Float>(input: &ArrayView2<'_, T>, shape: (usize, usize)) -> Result<Array2<T>> {
    let full_turn = T::from(360.0).unwrap_or_else(T::nan);
    let half_turn = T::from(180.0).unwrap_or_else(T::nan);

    let unwrap = move |reference: T, value: T| {
        let delta = value - reference;
        if delta > half_turn {
            value - full_turn
        } else if delta < -half_turn {
            value + full_turn
        } else {
            value
        }
    };

    resample_with(input, shape, move |[tl, tr, bl, br], wr, wc| {
        let top = lerp(tl, unwrap(tl, tr), wc);
        let bottom = lerp(unwrap(tl, bl), unwrap(tl, br), wc);
        let value = lerp(top, bottom, wr);
        if value > half_turn {
            value - full_turn
        } else if value < -half_turn {
            value + full_turn
        } else {
            value
        }
    })
}

/// Reconciles coordinate arrays with the pixel grid of a classification array
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateResampler;

impl CoordinateResampler {
    /// Return latitude/longitude arrays shaped like `target`
    ///
    /// Arrays that already match are borrowed untouched; only a mismatch
    /// triggers resampling.
    ///
    /// # Errors
    ///
    /// Returns a shape error if latitude and longitude disagree with each
    /// other, or a resample error if either array or the target is empty
    pub fn reconcile<'a>(
        latitude: ArrayView2<'a, f64>,
        longitude: ArrayView2<'a, f64>,
        target: (usize, usize),
    ) -> Result<(CowArray<'a, f64, Ix2>, CowArray<'a, f64, Ix2>)> {
        if latitude.dim() != longitude.dim() {
            return Err(unit_shape(
                latitude.dim(),
                longitude.dim(),
                &"latitude and longitude arrays differ in shape",
            ));
        }

        if latitude.dim() == target {
            return Ok((CowArray::from(latitude), CowArray::from(longitude)));
        }

        let lat = resample_linear(&latitude, target)?;
        let lon = resample_longitude(&longitude, target)?;
        Ok((CowArray::from(lat), CowArray::from(lon)))
    }
}
