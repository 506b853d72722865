//! Command-line interface for aggregating a directory of classified swaths

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use crate::algorithm::executor::{AggregationConfig, Aggregator, RunOutcome};
use crate::algorithm::unit::UnitSource;
use crate::io::configuration::{
    DEFAULT_RESOLUTION, DEFAULT_RUN_LABEL, DEFAULT_THRESHOLD, DEFAULT_UNIT_TIMEOUT_SECS,
};
use crate::io::error::{Result, invalid_configuration};
use crate::io::export::{ExportOptions, ResultWriter};
use crate::io::progress::ProgressManager;
use crate::io::source::{SwathPair, discover_classification_files};

#[derive(Parser, Debug)]
#[command(name = "swathgrid")]
#[command(
    author,
    version,
    about = "Aggregate classified satellite swaths into global count and ratio grids"
)]
/// Command-line arguments for an aggregation run
// Output toggles are independent switches
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Directory of classification PNGs
    #[arg(short = 'c', long, value_name = "DIR")]
    pub classification_dir: PathBuf,

    /// Directory of geolocation latitude/longitude TIFFs
    #[arg(short = 'g', long, value_name = "DIR")]
    pub geolocation_dir: PathBuf,

    /// Only process granules acquired on this day (YYYYDDD)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Grid cell size in degrees; must divide 180 evenly
    #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
    pub resolution: f64,

    /// Normalized intensity above which a pixel is classified as feature
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Number of concurrent workers (default: available parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-unit time budget in seconds, 0 to disable
    #[arg(long, default_value_t = DEFAULT_UNIT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Directory receiving the result rasters and summary
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Only write the ratio raster and summary
    #[arg(long)]
    pub ratio_only: bool,

    /// Also write a PNG preview of the ratio grid
    #[arg(short, long)]
    pub preview: bool,

    /// Average the daily ratio rasters of the output directory per year
    #[arg(short, long)]
    pub yearly_average: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Run configuration derived from the arguments
    pub fn aggregation_config(&self) -> AggregationConfig {
        let defaults = AggregationConfig::default();
        AggregationConfig {
            resolution: self.resolution,
            workers: self.workers.unwrap_or(defaults.workers),
            unit_timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        }
    }

    /// Label used to name the output artifacts
    pub fn run_label(&self) -> &str {
        self.date.as_deref().unwrap_or(DEFAULT_RUN_LABEL)
    }

    /// Artifacts requested on the command line
    pub const fn export_options(&self) -> ExportOptions {
        ExportOptions {
            ratio_only: self.ratio_only,
            preview: self.preview,
            yearly_average: self.yearly_average,
        }
    }
}

/// Discovers units, runs the aggregation and writes its results
pub struct BatchProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl BatchProcessor {
    /// Create a processor for the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Process the batch described by the CLI arguments
    ///
    /// Returns `None` when no classification raster matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the input directory
    /// cannot be read, or the results cannot be written
    pub fn process(&mut self) -> Result<Option<RunOutcome>> {
        let aggregator = Aggregator::new(self.cli.aggregation_config())?;
        if !(0.0..=1.0).contains(&self.cli.threshold) {
            return Err(invalid_configuration(
                "threshold",
                &self.cli.threshold,
                &"must lie within [0, 1]",
            ));
        }
        let units = self.collect_units()?;

        if units.is_empty() {
            warn!(
                "No classification rasters found in {}",
                self.cli.classification_dir.display()
            );
            return Ok(None);
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(units.len());
        }

        let outcome = match self.progress_manager.as_mut() {
            Some(pm) => aggregator.run_with_observer(units, |_, result| pm.record(result)),
            None => aggregator.run(units),
        };

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }
        let outcome = outcome?;

        let writer = ResultWriter::new(
            &self.cli.output_dir,
            self.cli.run_label(),
            self.cli.export_options(),
        );
        writer.write(&outcome)?;

        Ok(Some(outcome))
    }

    fn collect_units(&self) -> Result<Vec<Box<dyn UnitSource>>> {
        let files =
            discover_classification_files(&self.cli.classification_dir, self.cli.date.as_deref())?;
        info!(
            "Found {} classification rasters in {}",
            files.len(),
            self.cli.classification_dir.display()
        );

        Ok(files
            .into_iter()
            .map(|path| {
                SwathPair::new(path, self.cli.geolocation_dir.clone(), self.cli.threshold).boxed()
            })
            .collect())
    }
}
