//! File-backed work units: classification PNGs paired with geolocation TIFFs
//!
//! A granule is identified by the acquisition date and time fields of its
//! classification raster name, e.g. `A2013001.0000` in
//! `MOD021KM.A2013001.0000.061.2017295083828_RGB_denoised.png`. The matching
//! latitude and longitude rasters are `MOD03.A2013001.0000*_lat.tif` and
//! `MOD03.A2013001.0000*_lon.tif`. Nothing is opened until a worker calls
//! [`UnitSource::load`].

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;
use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};

use crate::algorithm::unit::{UnitRaster, UnitSource};
use crate::analysis::classify::classify_threshold;
use crate::io::configuration::{
    CLASSIFICATION_EXTENSION, CLASSIFICATION_MARKER, CLASSIFICATION_PREFIX, GEOLOCATION_PREFIX,
    LATITUDE_SUFFIX, LONGITUDE_SUFFIX,
};
use crate::io::error::{AggregationError, Result, invalid_configuration, unit_resolution};

/// One classification raster and the directory holding its geolocation
#[derive(Debug, Clone)]
pub struct SwathPair {
    classification: PathBuf,
    geolocation_dir: PathBuf,
    threshold: f64,
}

impl SwathPair {
    /// Reference a classification raster; the geolocation is looked up on load
    pub fn new(classification: PathBuf, geolocation_dir: PathBuf, threshold: f64) -> Self {
        Self {
            classification,
            geolocation_dir,
            threshold,
        }
    }

    /// Path of the classification raster
    pub fn classification(&self) -> &Path {
        &self.classification
    }

    /// Box the unit for submission to a scheduler
    pub fn boxed(self) -> Box<dyn UnitSource> {
        Box::new(self)
    }
}

impl UnitSource for SwathPair {
    fn identifier(&self) -> String {
        file_name(&self.classification)
    }

    fn load(&self) -> Result<UnitRaster> {
        let identifier = self.identifier();
        let key = granule_key(&identifier)
            .ok_or_else(|| unit_resolution(&identifier, &"name has no granule date/time fields"))?;
        let (lat_path, lon_path) = find_geolocation(&self.geolocation_dir, &key)?
            .ok_or_else(|| {
                unit_resolution(
                    &identifier,
                    &format!(
                        "no {GEOLOCATION_PREFIX}.{key} latitude/longitude pair in '{}'",
                        self.geolocation_dir.display()
                    ),
                )
            })?;
        debug!(
            "Resolved {identifier} to {} and {}",
            lat_path.display(),
            lon_path.display()
        );

        let image = image::open(&self.classification)
            .map_err(|source| AggregationError::ImageLoad {
                path: self.classification.clone(),
                source,
            })?
            .into_luma8();
        let mask = classify_threshold(&image, self.threshold)?;

        let latitude = read_float_tiff(&lat_path)?;
        let longitude = read_float_tiff(&lon_path)?;
        UnitRaster::new(mask, latitude, longitude)
    }
}

/// List classification rasters in `dir`, sorted by name
///
/// With `date` (`YYYYDDD`) only granules acquired on that day are returned.
///
/// # Errors
///
/// Returns a configuration error for a malformed date and a file system error
/// if the directory cannot be read
pub fn discover_classification_files(dir: &Path, date: Option<&str>) -> Result<Vec<PathBuf>> {
    if let Some(date) = date
        && (date.len() != 7 || !date.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(invalid_configuration(
            "date",
            &date,
            &"expected seven digits in YYYYDDD form",
        ));
    }

    let entries = fs::read_dir(dir).map_err(|source| AggregationError::FileSystem {
        path: dir.to_path_buf(),
        operation: "list classification rasters",
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_classification_name(&file_name(&path), date) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_classification_name(name: &str, date: Option<&str>) -> bool {
    let fields: Vec<&str> = name.split('.').collect();
    let [prefix, day, _time, _version, .., extension] = fields.as_slice() else {
        return false;
    };
    if *prefix != CLASSIFICATION_PREFIX || !extension.eq_ignore_ascii_case(CLASSIFICATION_EXTENSION) {
        return false;
    }
    if !name.contains(CLASSIFICATION_MARKER) || !day.starts_with('A') {
        return false;
    }
    date.is_none_or(|date| day.get(1..) == Some(date))
}

/// Granule key (`A<YYYYDDD>.<HHMM>`) of a raster name
///
/// Returns `None` for names with fewer than four dot-separated fields.
pub fn granule_key(name: &str) -> Option<String> {
    let mut fields = name.split('.');
    let _product = fields.next()?;
    let day = fields.next()?;
    let time = fields.next()?;
    fields.next()?;
    Some(format!("{day}.{time}"))
}

/// Latitude and longitude rasters of a granule, if both exist
///
/// When several candidates match, the lexicographically first one wins.
///
/// # Errors
///
/// Returns a file system error if the directory cannot be read
pub fn find_geolocation(dir: &Path, key: &str) -> Result<Option<(PathBuf, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|source| AggregationError::FileSystem {
        path: dir.to_path_buf(),
        operation: "list geolocation rasters",
        source,
    })?;

    let prefix = format!("{GEOLOCATION_PREFIX}.{key}");
    let mut latitude: Option<PathBuf> = None;
    let mut longitude: Option<PathBuf> = None;

    for entry in entries {
        let path = entry?.path();
        let name = file_name(&path);
        if !name.starts_with(&prefix) {
            continue;
        }
        let slot = if name.ends_with(LATITUDE_SUFFIX) {
            &mut latitude
        } else if name.ends_with(LONGITUDE_SUFFIX) {
            &mut longitude
        } else {
            continue;
        };
        if slot.as_ref().is_none_or(|current| path < *current) {
            *slot = Some(path);
        }
    }

    Ok(latitude.zip(longitude))
}

/// Decode a single-band floating point TIFF into an `f64` array
///
/// # Errors
///
/// Returns a file system error if the file cannot be opened, or a decode
/// error if it is not a readable single-band F32/F64 raster
pub fn read_float_tiff(path: &Path) -> Result<Array2<f64>> {
    let decode_error = |source| AggregationError::RasterDecode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| AggregationError::FileSystem {
        path: path.to_path_buf(),
        operation: "open float raster",
        source,
    })?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(decode_error)?;
    let (width, height) = decoder.dimensions().map_err(decode_error)?;
    let shape = (height as usize, width as usize);

    let values: Vec<f64> = match decoder.read_image().map_err(decode_error)? {
        DecodingResult::F64(data) => data,
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        _ => {
            return Err(unit_resolution(
                &file_name(path),
                &"raster must hold 32- or 64-bit floats",
            ));
        }
    };

    Array2::from_shape_vec(shape, values).map_err(|e| {
        unit_resolution(
            &file_name(path),
            &format!("expected a single band of {}x{} samples: {e}", shape.0, shape.1),
        )
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
