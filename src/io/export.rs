//! GeoTIFF, JSON and PNG export of a finished run

use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use image::{ImageBuffer, LumaA};
use log::{debug, info, warn};
use ndarray::Array2;
use serde::Serialize;
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

use crate::algorithm::executor::RunOutcome;
use crate::algorithm::unit::UnitFailure;
use crate::analysis::ratio::RatioMatrix;
use crate::analysis::summary::RunSummary;
use crate::analysis::yearly::{YearlyAverager, YearlyMean, daily_ratio_year};
use crate::io::configuration::{
    BACKGROUND_DIR, FEATURE_DIR, PREVIEW_DIR, RATIO_DIR, SUMMARY_DIR, YEARLY_DIR, YEARLY_INFO_FILE,
};
use crate::io::error::{AggregationError, Result, computation_error};
use crate::io::source::read_float_tiff;
use crate::spatial::grid::{CountGrid, GridSpec};

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;

/// GeoKey directory: header, then geographic model, pixel-is-area, WGS84
const WGS84_GEO_KEYS: [u16; 16] = [
    1, 1, 0, 3, //
    1024, 0, 1, 2, //
    1025, 0, 1, 1, //
    2048, 0, 1, 4326,
];

/// Which artifacts a [`ResultWriter`] produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Skip the two count rasters
    pub ratio_only: bool,
    /// Also write a PNG preview of the ratio matrix
    pub preview: bool,
    /// Afterwards average every daily ratio raster in the output directory per year
    pub yearly_average: bool,
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    label: &'a str,
    elapsed_secs: f64,
    summary: &'a RunSummary,
    failures: &'a [UnitFailure],
}

/// Writes the rasters and summary of a run under one output directory
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
    label: String,
    options: ExportOptions,
}

impl ResultWriter {
    /// Writer for `output_dir`, naming every artifact after `label`
    pub fn new(output_dir: impl Into<PathBuf>, label: impl Into<String>, options: ExportOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            label: label.into(),
            options,
        }
    }

    /// Path of an artifact inside its subdirectory
    pub fn artifact_path(&self, dir: &str, extension: &str) -> PathBuf {
        self.output_dir
            .join(dir)
            .join(format!("{dir}_{}.{extension}", self.label))
    }

    /// Write every configured artifact and return the written paths
    ///
    /// # Errors
    ///
    /// Returns a file system error if a directory cannot be created, an
    /// export error if a raster cannot be encoded, or a serialization error
    /// for the summary
    pub fn write(&self, outcome: &RunOutcome) -> Result<Vec<PathBuf>> {
        let spec = outcome.grid.spec();
        let mut written = Vec::new();

        if !self.options.ratio_only {
            let counts = outcome.grid.counts();
            let path = self.artifact_path(BACKGROUND_DIR, "tif");
            write_count_geotiff(&path, counts.background(), spec)?;
            written.push(path);

            let path = self.artifact_path(FEATURE_DIR, "tif");
            write_count_geotiff(&path, counts.feature(), spec)?;
            written.push(path);
        }

        let path = self.artifact_path(RATIO_DIR, "tif");
        write_ratio_geotiff(&path, &outcome.ratio, spec)?;
        written.push(path);

        let path = self.artifact_path(SUMMARY_DIR, "json");
        let report = SummaryReport {
            label: &self.label,
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            summary: &outcome.summary,
            failures: &outcome.failures,
        };
        write_json(&path, &report)?;
        written.push(path);

        if self.options.preview {
            let path = self.artifact_path(PREVIEW_DIR, "png");
            export_ratio_preview(&outcome.ratio, outcome.grid.counts(), &path)?;
            written.push(path);
        }

        if self.options.yearly_average {
            written.extend(write_yearly_averages(&self.output_dir)?);
        }

        info!(
            "Wrote {} artifacts to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }
}

/// Write background or feature counts as a u64 GeoTIFF
///
/// # Errors
///
/// Returns a file system or export error if the raster cannot be written
pub fn write_count_geotiff(path: &Path, counts: &Array2<u64>, spec: &GridSpec) -> Result<()> {
    let data: Vec<u64> = counts.iter().copied().collect();
    write_geotiff::<colortype::Gray64>(path, &data, spec)
}

/// Write the ratio matrix as an f32 GeoTIFF
///
/// # Errors
///
/// Returns a file system or export error if the raster cannot be written
pub fn write_ratio_geotiff(path: &Path, ratio: &RatioMatrix, spec: &GridSpec) -> Result<()> {
    let data: Vec<f32> = ratio.values().iter().map(|&v| v as f32).collect();
    write_geotiff::<colortype::Gray32Float>(path, &data, spec)
}

fn write_geotiff<C>(path: &Path, data: &[C::Inner], spec: &GridSpec) -> Result<()>
where
    C: colortype::ColorType,
    [C::Inner]: tiff::encoder::TiffValue,
{
    let mut writer = BufWriter::new(create_file(path)?);
    encode_geotiff::<C, _>(&mut writer, data, spec).map_err(|e| AggregationError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    finish_file(writer, path)
}

fn encode_geotiff<C, W>(writer: W, data: &[C::Inner], spec: &GridSpec) -> tiff::TiffResult<()>
where
    C: colortype::ColorType,
    [C::Inner]: tiff::encoder::TiffValue,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<C>(spec.cols() as u32, spec.rows() as u32)?;

    let res = spec.resolution();
    let directory = image.encoder();
    directory.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE_TAG), [res, res, 0.0].as_slice())?;
    directory.write_tag(
        Tag::Unknown(MODEL_TIEPOINT_TAG),
        [0.0, 0.0, 0.0, -180.0, 90.0, 0.0].as_slice(),
    )?;
    directory.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY_TAG), WGS84_GEO_KEYS.as_slice())?;

    image.write_data(data)
}

/// Average the daily ratio rasters below `output_dir` per year
///
/// Reads every `ratio/ratio_<YYYYDDD>.tif`, sums each year's values per cell
/// while skipping NaN, and divides by the number of daily rasters of that
/// year. Writes `yearavg/ratio_<year>_avg.tif` for every year plus a
/// `yearavg/processing_info.txt` listing the day counts.
///
/// # Errors
///
/// Returns a file system error if the ratio directory cannot be listed, a
/// decode error for an unreadable raster, a computation error if the rasters
/// of one year disagree in shape or match no valid grid, or an export error
/// if a mean raster cannot be written
pub fn write_yearly_averages(output_dir: &Path) -> Result<Vec<PathBuf>> {
    let ratio_dir = output_dir.join(RATIO_DIR);
    let entries = fs::read_dir(&ratio_dir).map_err(|source| AggregationError::FileSystem {
        path: ratio_dir.clone(),
        operation: "read ratio directory",
        source,
    })?;

    let mut daily: Vec<(u16, PathBuf)> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| {
            let year = daily_ratio_year(entry.file_name().to_str()?)?;
            Some((year, entry.path()))
        })
        .collect();
    daily.sort();

    let mut averager = YearlyAverager::new();
    for (year, path) in &daily {
        debug!("Adding {} to {year}", path.display());
        averager.add(*year, &read_float_tiff(path)?)?;
    }
    let years = averager.finish();
    if years.is_empty() {
        warn!("No daily ratio rasters in {}", ratio_dir.display());
        return Ok(Vec::new());
    }

    let yearly_dir = output_dir.join(YEARLY_DIR);
    let mut written = Vec::with_capacity(years.len() + 1);
    for year in &years {
        let path = yearly_dir.join(format!("{RATIO_DIR}_{}_avg.tif", year.year()));
        write_yearly_mean(&path, year)?;
        written.push(path);
    }

    let path = yearly_dir.join(YEARLY_INFO_FILE);
    write_day_counts(&path, &years)?;
    written.push(path);

    info!(
        "Averaged {} daily ratio rasters into {} years",
        daily.len(),
        years.len()
    );
    Ok(written)
}

fn write_yearly_mean(path: &Path, year: &YearlyMean) -> Result<()> {
    let (rows, cols) = year.dim();
    let spec = GridSpec::new(180.0 / rows.max(1) as f64)
        .ok()
        .filter(|spec| spec.shape() == (rows, cols))
        .ok_or_else(|| {
            computation_error(
                "yearly mean",
                &format!("{rows}x{cols} daily rasters of {} match no global grid", year.year()),
            )
        })?;

    let data: Vec<f32> = year.mean().iter().map(|&v| v as f32).collect();
    write_geotiff::<colortype::Gray32Float>(path, &data, &spec)
}

fn write_day_counts(path: &Path, years: &[YearlyMean]) -> Result<()> {
    let mut writer = BufWriter::new(create_file(path)?);
    for year in years {
        writeln!(writer, "{}: {} days", year.year(), year.days()).map_err(|source| {
            AggregationError::FileSystem {
                path: path.to_path_buf(),
                operation: "write day counts",
                source,
            }
        })?;
    }
    finish_file(writer, path)
}

/// Render the ratio matrix as a grayscale PNG, cells without data transparent
///
/// # Errors
///
/// Returns a file system or export error if the image cannot be written
pub fn export_ratio_preview(ratio: &RatioMatrix, counts: &CountGrid, path: &Path) -> Result<()> {
    let (rows, cols) = ratio.dim();
    let img = ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
        let (row, col) = (y as usize, x as usize);
        let observed = counts.cell(row, col).is_some_and(|(b, f)| b + f > 0);
        let value = ratio.get(row, col).unwrap_or(0.0);
        let level = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        LumaA([level, if observed { 255 } else { 0 }])
    });

    create_parent(path)?;
    img.save(path).map_err(|e| AggregationError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
        AggregationError::Serialization {
            path: path.to_path_buf(),
            source,
        }
    })?;
    finish_file(writer, path)
}

/// Flush buffered output so write errors surface instead of vanishing on drop
fn finish_file(writer: BufWriter<File>, path: &Path) -> Result<()> {
    writer
        .into_inner()
        .map(drop)
        .map_err(|e| AggregationError::FileSystem {
            path: path.to_path_buf(),
            operation: "flush output file",
            source: e.into_error(),
        })
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| AggregationError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create output directory",
            source,
        }),
        None => Ok(()),
    }
}

fn create_file(path: &Path) -> Result<File> {
    create_parent(path)?;
    File::create(path).map_err(|source| AggregationError::FileSystem {
        path: path.to_path_buf(),
        operation: "create output file",
        source,
    })
}
