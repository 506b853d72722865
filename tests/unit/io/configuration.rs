//! Tests for configuration constants consistency

#[cfg(test)]
mod tests {
    use swathgrid::io::configuration::{
        BACKGROUND_DIR, CANCELLATION_CHECK_ROWS, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD,
        DEFAULT_UNIT_TIMEOUT_SECS, FEATURE_DIR, LATITUDE_SUFFIX, LONGITUDE_SUFFIX, MAX_RESOLUTION,
        PREVIEW_DIR, PROGRESS_BAR_WIDTH, RATIO_DIR, SUMMARY_DIR, YEARLY_DIR,
    };
    use swathgrid::spatial::grid::GridSpec;

    // Tests the default and maximum resolutions build valid grids
    // Verified by setting the default resolution to 0.7
    #[test]
    fn test_resolutions_are_valid() {
        assert!(GridSpec::new(DEFAULT_RESOLUTION).is_ok());
        assert!(GridSpec::new(MAX_RESOLUTION).is_ok());
    }

    // Tests scheduling defaults are usable
    // Verified by setting the cancellation interval to zero
    #[test]
    fn test_scheduling_defaults() {
        assert!(CANCELLATION_CHECK_ROWS > 0);
        assert!(DEFAULT_UNIT_TIMEOUT_SECS > 0);
        assert!((0.0..=1.0).contains(&DEFAULT_THRESHOLD));
        assert!(PROGRESS_BAR_WIDTH > 0);
    }

    // Tests output directories and coordinate suffixes are distinct
    // Verified by reusing a directory name
    #[test]
    fn test_names_are_distinct() {
        let dirs = [
            BACKGROUND_DIR,
            FEATURE_DIR,
            RATIO_DIR,
            SUMMARY_DIR,
            PREVIEW_DIR,
            YEARLY_DIR,
        ];
        for (i, a) in dirs.iter().enumerate() {
            for b in dirs.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert_ne!(LATITUDE_SUFFIX, LONGITUDE_SUFFIX);
    }
}
