//! Tests for per-cell ratio derivation

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use swathgrid::algorithm::accumulator::PartialGrid;
    use swathgrid::algorithm::reducer::reduce;
    use swathgrid::algorithm::unit::WorkResult;
    use swathgrid::analysis::ratio::{RatioMatrix, ratio};
    use swathgrid::spatial::grid::{CountGrid, GridSpec};

    // Tests the ratio formula and its empty-cell guard
    // Verified by dividing by background only
    #[test]
    fn test_ratio_formula() {
        assert!((ratio(3, 1) - 0.25).abs() < f64::EPSILON);
        assert!((ratio(3, 7) - 0.7).abs() < 1e-12);
        assert!((ratio(0, 5) - 1.0).abs() < f64::EPSILON);
        assert!(ratio(7, 0).abs() < f64::EPSILON);
        assert!(ratio(0, 0).abs() < f64::EPSILON);
        assert!(!ratio(0, 0).is_nan());
    }

    // Tests every cell of the derived matrix
    // Verified by swapping background and feature
    #[test]
    fn test_derive_matrix() {
        let spec = GridSpec::new(90.0).expect("90° is valid");
        let mut background = Array2::zeros(spec.shape());
        let mut feature = Array2::zeros(spec.shape());
        if let Some(cell) = background.get_mut([0, 0]) {
            *cell = 3;
        }
        if let Some(cell) = feature.get_mut([0, 0]) {
            *cell = 1;
        }
        if let Some(cell) = feature.get_mut([1, 2]) {
            *cell = 4;
        }
        let counts = CountGrid::from_parts(background, feature).expect("shapes agree");
        let result = WorkResult::Success {
            unit: "only".to_string(),
            partial: PartialGrid::from_counts(counts, 0),
        };
        let grid = reduce(spec, vec![result]).grid;

        let matrix = RatioMatrix::derive(&grid);
        assert_eq!(matrix.dim(), (2, 4));
        assert_eq!(matrix.get(0, 0), Some(0.25));
        assert_eq!(matrix.get(1, 2), Some(1.0));
        assert_eq!(matrix.get(1, 1), Some(0.0));
        assert_eq!(matrix.get(2, 0), None);
        assert!(matrix.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
