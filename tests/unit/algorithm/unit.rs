//! Tests for unit rasters, in-memory sources and result records

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use swathgrid::AggregationError;
    use swathgrid::algorithm::accumulator::PartialGrid;
    use swathgrid::algorithm::unit::{InMemoryUnit, UnitFailure, UnitRaster, WorkResult};
    use swathgrid::analysis::classify::BinaryMask;
    use swathgrid::io::error::FailureCategory;
    use swathgrid::spatial::grid::{CountGrid, GridSpec};

    // Tests latitude and longitude must share a shape
    // Verified by comparing the mask shape instead
    #[test]
    fn test_raster_coordinate_shapes() {
        let mask = BinaryMask::filled((4, 4), false);
        let ok = UnitRaster::new(mask.clone(), Array2::zeros((2, 2)), Array2::zeros((2, 2)));
        assert!(ok.is_ok());

        let mismatch = UnitRaster::new(mask, Array2::zeros((2, 2)), Array2::zeros((2, 3)));
        assert!(matches!(mismatch, Err(AggregationError::UnitShape { .. })));
    }

    // Tests an in-memory unit loads the raster it wraps
    // Verified by returning a blank raster from load
    #[test]
    fn test_in_memory_unit_load() {
        let mask = BinaryMask::filled((2, 3), true);
        let raster = UnitRaster::new(mask, Array2::from_elem((2, 3), 12.0), Array2::zeros((2, 3)))
            .expect("coordinate shapes agree");
        let mut unit = InMemoryUnit::new("granule-7", raster).boxed();

        assert_eq!(unit.identifier(), "granule-7");
        let loaded = unit.load().expect("in-memory load succeeds");
        assert_eq!(loaded.mask().feature_pixels(), 6);
        assert!(loaded.latitude().iter().all(|&v| (v - 12.0).abs() < f64::EPSILON));
        assert!(unit.release().is_ok());
    }

    // Tests failures take their category from the underlying error
    // Verified by hardcoding the internal category
    #[test]
    fn test_failure_from_error() {
        let error = AggregationError::Timeout {
            unit: "slow".to_string(),
            limit_ms: 250,
        };
        let failure = UnitFailure::from_error("slow", &error);
        assert_eq!(failure.category, FailureCategory::Timeout);
        assert!(failure.reason.contains("250 ms"));
        assert_eq!(failure.to_string(), format!("slow [timeout]: {}", failure.reason));
    }

    // Tests result accessors for both variants
    // Verified by reporting every result as a success
    #[test]
    fn test_work_result_accessors() {
        let spec = GridSpec::new(90.0).expect("90° is valid");
        let success = WorkResult::Success {
            unit: "a".to_string(),
            partial: PartialGrid::from_counts(CountGrid::zeros(&spec), 0),
        };
        let failure = WorkResult::Failure(UnitFailure::new("b", FailureCategory::Shape, "bad"));

        assert!(success.is_success());
        assert_eq!(success.unit(), "a");
        assert!(!failure.is_success());
        assert_eq!(failure.unit(), "b");
    }
}
