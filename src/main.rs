//! CLI entry point for swath-to-grid aggregation

use clap::Parser;
use env_logger::Env;
use swathgrid::io::cli::{BatchProcessor, Cli};

fn main() -> swathgrid::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let mut processor = BatchProcessor::new(cli);
    processor.process()?;
    Ok(())
}
