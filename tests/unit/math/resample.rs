//! Tests for corner-aligned bilinear zoom and coordinate reconciliation

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};
    use swathgrid::AggregationError;
    use swathgrid::math::resample::{CoordinateResampler, resample_linear, resample_longitude};

    // Tests resampling to the same shape returns the input unchanged
    // Verified by offsetting sample positions by half a pixel
    #[test]
    fn test_identity_shape() {
        let input = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let output = resample_linear(&input.view(), (2, 3)).expect("valid shapes");
        assert_eq!(output, input);
    }

    // Tests upsampling places new samples between the originals
    // Verified by swapping row and column weights
    #[test]
    fn test_upsample_bilinear() {
        let input = array![[0.0, 10.0], [20.0, 30.0]];
        let output = resample_linear(&input.view(), (3, 3)).expect("valid shapes");
        let expected = array![[0.0, 5.0, 10.0], [10.0, 15.0, 20.0], [20.0, 25.0, 30.0]];
        assert_eq!(output, expected);
    }

    // Tests downsampling keeps the corner samples
    // Verified by scaling positions by n_in / n_out
    #[test]
    fn test_downsample_corner_aligned() {
        let input = array![[0.0_f32, 1.0, 2.0, 3.0, 4.0]];
        let output = resample_linear(&input.view(), (1, 3)).expect("valid shapes");
        assert_eq!(output, array![[0.0_f32, 2.0, 4.0]]);
    }

    // Tests a single-sample target axis reads the first input sample
    // Verified by reading the center sample instead
    #[test]
    fn test_single_sample_axis() {
        let input = array![[7.0, 8.0, 9.0], [1.0, 2.0, 3.0]];
        let output = resample_linear(&input.view(), (1, 1)).expect("valid shapes");
        assert_eq!(output, array![[7.0]]);
    }

    // Tests NaN samples spread into every output whose taps include them
    // Verified by skipping NaN neighbours
    #[test]
    fn test_nan_propagation() {
        let input = array![[0.0, f64::NAN]];
        let output = resample_linear(&input.view(), (1, 3)).expect("valid shapes");
        assert!(output.iter().all(|v| v.is_nan()));
    }

    // Tests an output aligned with a finite sample is still NaN when its
    // other tap is NaN, so the pixel is later rejected
    // Verified by returning the aligned sample for a zero weight
    #[test]
    fn test_nan_neighbour_with_zero_weight() {
        let input = array![[1.0, 2.0, f64::NAN], [3.0, 4.0, 5.0]];
        let output = resample_linear(&input.view(), (2, 5)).expect("valid shapes");

        // Column 2 sits exactly on input column 1, whose right tap is NaN
        assert!(output.get([0, 2]).is_some_and(|v| v.is_nan()));
        assert!(output.get([0, 1]).is_some_and(|v| !v.is_nan()));
        assert_eq!(output.get([1, 2]).copied(), Some(4.0));

        let lon = array![[10.0, f64::NAN]];
        let wrapped = resample_longitude(&lon.view(), (1, 2)).expect("valid shapes");
        assert!(wrapped.iter().all(|v| v.is_nan()));
    }

    // Tests empty inputs and targets are resample errors
    // Verified by removing the empty-shape validation
    #[test]
    fn test_empty_shapes() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            resample_linear(&empty.view(), (2, 2)),
            Err(AggregationError::Resample { .. })
        ));

        let input = array![[1.0, 2.0]];
        assert!(matches!(
            resample_linear(&input.view(), (0, 2)),
            Err(AggregationError::Resample { .. })
        ));
    }

    // Tests longitudes interpolate across the antimeridian instead of through 0°
    // Verified by using plain linear interpolation for longitudes
    #[test]
    fn test_longitude_antimeridian() {
        let input = array![[170.0, -170.0]];
        let output = resample_longitude(&input.view(), (1, 5)).expect("valid shapes");
        assert_eq!(output, array![[170.0, 175.0, 180.0, -175.0, -170.0]]);
    }

    // Tests longitudes away from the antimeridian match plain interpolation
    // Verified by unwrapping every neighbour by a full turn
    #[test]
    fn test_longitude_regular() {
        let input = array![[10.0, 20.0], [30.0, 40.0]];
        let plain = resample_linear(&input.view(), (3, 4)).expect("valid shapes");
        let wrapped = resample_longitude(&input.view(), (3, 4)).expect("valid shapes");
        assert_eq!(plain, wrapped);
    }

    // Tests matching shapes are borrowed and mismatches resampled
    // Verified by always resampling
    #[test]
    fn test_reconcile_borrows_matching_shapes() {
        let lat = array![[10.0, 10.0], [0.0, 0.0]];
        let lon = array![[0.0, 10.0], [0.0, 10.0]];

        let (same_lat, same_lon) =
            CoordinateResampler::reconcile(lat.view(), lon.view(), (2, 2)).expect("same shape");
        assert!(same_lat.is_view());
        assert!(same_lon.is_view());

        let (big_lat, big_lon) =
            CoordinateResampler::reconcile(lat.view(), lon.view(), (3, 3)).expect("resampled");
        assert!(!big_lat.is_view());
        assert_eq!(big_lat.dim(), (3, 3));
        assert_eq!(big_lat.get([1, 1]).copied(), Some(5.0));
        assert_eq!(big_lon.get([1, 1]).copied(), Some(5.0));
    }

    // Tests latitude and longitude of different shapes are rejected
    // Verified by resampling each array independently
    #[test]
    fn test_reconcile_coordinate_mismatch() {
        let lat = Array2::<f64>::zeros((2, 2));
        let lon = Array2::<f64>::zeros((2, 3));
        let result = CoordinateResampler::reconcile(lat.view(), lon.view(), (4, 4));
        assert!(matches!(result, Err(AggregationError::UnitShape { .. })));
    }
}
