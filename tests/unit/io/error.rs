//! Tests for error display, source chaining and failure categories

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;
    use swathgrid::AggregationError;
    use swathgrid::io::error::{
        FailureCategory, computation_error, invalid_configuration, unit_resolution, unit_shape,
    };

    // Tests configuration errors name the parameter, value and reason
    // Verified by omitting the value from the message
    #[test]
    fn test_configuration_display() {
        let error = invalid_configuration("resolution", &0.7, &"must divide 180");
        assert_eq!(
            error.to_string(),
            "Invalid configuration 'resolution' = '0.7': must divide 180"
        );
        assert!(error.is_fatal());
        assert_eq!(error.category(), FailureCategory::Internal);
    }

    // Tests per-unit errors are never fatal to the run
    // Verified by treating resolution errors as fatal
    #[test]
    fn test_unit_errors_not_fatal() {
        let errors = [
            unit_resolution(&"granule", &"missing"),
            unit_shape((2, 2), (3, 3), &"coordinates differ"),
            AggregationError::Timeout {
                unit: "granule".to_string(),
                limit_ms: 100,
            },
            AggregationError::Cancelled { rows_processed: 64 },
            computation_error("ratio", &"inconsistent"),
        ];
        assert!(errors.iter().all(|e| !e.is_fatal()));
    }

    // Tests each error variant maps to its reporting category
    // Verified by mapping cancellation to internal
    #[test]
    fn test_categories() {
        assert_eq!(
            unit_resolution(&"g", &"x").category(),
            FailureCategory::Resolution
        );
        assert_eq!(
            unit_shape((1, 1), (2, 2), &"x").category(),
            FailureCategory::Shape
        );
        assert_eq!(
            AggregationError::Resample {
                reason: "empty".to_string()
            }
            .category(),
            FailureCategory::Shape
        );
        assert_eq!(
            AggregationError::Cancelled { rows_processed: 0 }.category(),
            FailureCategory::Timeout
        );
        assert_eq!(
            AggregationError::from(io::Error::other("disk")).category(),
            FailureCategory::Resolution
        );
        assert_eq!(
            computation_error("reduce", &"x").category(),
            FailureCategory::Internal
        );
    }

    // Tests wrapped I/O errors are exposed as the error source
    // Verified by returning None from source for every variant
    #[test]
    fn test_source_chaining() {
        let error = AggregationError::FileSystem {
            path: PathBuf::from("/data/out"),
            operation: "create directory",
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(error.source().is_some());
        assert!(error.to_string().contains("create directory"));
        assert!(error.to_string().contains("/data/out"));

        let plain = unit_resolution(&"granule", &"missing");
        assert!(plain.source().is_none());
    }

    // Tests timeout messages carry the unit and its budget
    // Verified by printing the budget in seconds
    #[test]
    fn test_timeout_display() {
        let error = AggregationError::Timeout {
            unit: "slow.png".to_string(),
            limit_ms: 1500,
        };
        assert_eq!(
            error.to_string(),
            "Unit 'slow.png' exceeded its time budget of 1500 ms"
        );
    }

    // Tests failure categories print as lowercase labels
    // Verified by using the Debug representation
    #[test]
    fn test_category_display() {
        let labels: Vec<String> = [
            FailureCategory::Resolution,
            FailureCategory::Shape,
            FailureCategory::Timeout,
            FailureCategory::Internal,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(labels, vec!["resolution", "shape", "timeout", "internal"]);
    }
}
