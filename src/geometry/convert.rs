//! Uploaded vector file -> GeoJSON or WKT
//!
//! The upload is staged into a private temporary directory and read back by a
//! driver chosen from its extension. The directory lives exactly as long as
//! the [`StagedUpload`] guard.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use geo::Geometry;
use geojson::{GeoJson, JsonObject};
use kml::{quick_collection, Kml};
use serde_json::Value;
use tempfile::TempDir;
use wkt::{ToWkt, TryFromWkt};

use super::codec::{feature_collection, from_geojson, ParsedFeature};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    GeoJson,
    Wkt,
}

impl FromStr for OutputFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geojson" => Ok(Self::GeoJson),
            "wkt" => Ok(Self::Wkt),
            other => Err(ApiError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Readers known to the convert endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputDriver {
    GeoJson,
    Kml,
    Wkt,
}

impl InputDriver {
    fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "geojson" | "json" => Some(Self::GeoJson),
            "kml" => Some(Self::Kml),
            "wkt" | "txt" => Some(Self::Wkt),
            _ => None,
        }
    }
}

/// Final path component of a client-supplied file name
fn sanitize_file_name(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    match last {
        "" | "." | ".." => None,
        _ => Some(last),
    }
}

/// Upload written to disk; removing the guard removes the directory
pub struct StagedUpload {
    dir: TempDir,
    path: PathBuf,
}

impl StagedUpload {
    pub fn write(file_name: &str, content: &[u8]) -> ApiResult<Self> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| ApiError::UnsupportedInput(file_name.to_string()))?;
        let dir = tempfile::Builder::new().prefix("geoapi-").tempdir()?;
        let path = dir.path().join(name);
        fs::write(&path, content)?;
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Read every feature of a staged file
pub fn read_dataset(path: &Path) -> ApiResult<Vec<ParsedFeature>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let driver = InputDriver::for_path(path).ok_or_else(|| ApiError::UnsupportedInput(name.clone()))?;

    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ApiError::InvalidUpload(format!("{name} is not valid UTF-8")))?;

    match driver {
        InputDriver::GeoJson => read_geojson(&name, &text),
        InputDriver::Kml => read_kml(&name, &text),
        InputDriver::Wkt => read_wkt(&text),
    }
}

fn read_geojson(name: &str, text: &str) -> ApiResult<Vec<ParsedFeature>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ApiError::InvalidUpload(format!("{name}: {e}")))?;

    match GeoJson::from_json_value(value)? {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().map(feature_of).collect(),
        GeoJson::Feature(f) => Ok(vec![feature_of(f)?]),
        GeoJson::Geometry(g) => Ok(vec![ParsedFeature {
            geometry: Some(from_geojson(g)?),
            properties: JsonObject::new(),
        }]),
    }
}

fn feature_of(feature: geojson::Feature) -> ApiResult<ParsedFeature> {
    Ok(ParsedFeature {
        geometry: feature.geometry.map(from_geojson).transpose()?,
        properties: feature.properties.unwrap_or_default(),
    })
}

/// One feature per placemark geometry, in document order
fn read_kml(name: &str, text: &str) -> ApiResult<Vec<ParsedFeature>> {
    let document: Kml<f64> = text
        .parse()
        .map_err(|e| ApiError::InvalidUpload(format!("{name}: {e}")))?;
    let collection = quick_collection(document)
        .map_err(|e| ApiError::InvalidGeometry(format!("{name}: {e}")))?;

    Ok(collection
        .into_iter()
        .map(|geometry| ParsedFeature {
            geometry: Some(geometry),
            properties: JsonObject::new(),
        })
        .collect())
}

fn read_wkt(text: &str) -> ApiResult<Vec<ParsedFeature>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let geometry = Geometry::<f64>::try_from_wkt_str(line.trim())
                .map_err(|e| ApiError::InvalidGeometry(format!("line {}: {e}", i + 1)))?;
            Ok(ParsedFeature {
                geometry: Some(geometry),
                properties: JsonObject::new(),
            })
        })
        .collect()
}

fn encode(features: &[ParsedFeature], format: OutputFormat) -> ApiResult<Value> {
    match format {
        OutputFormat::GeoJson => Ok(serde_json::to_value(feature_collection(features))?),
        OutputFormat::Wkt => Ok(Value::Array(
            features
                .iter()
                .map(|f| {
                    f.geometry
                        .as_ref()
                        .map_or(Value::Null, |g| Value::String(g.wkt_string()))
                })
                .collect(),
        )),
    }
}

/// Stage, read and re-encode one uploaded file
pub fn convert_upload(file_name: &str, content: &[u8], format: OutputFormat) -> ApiResult<Value> {
    let staged = StagedUpload::write(file_name, content)?;
    let features = read_dataset(staged.path())?;
    encode(&features, format)
}
