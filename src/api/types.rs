// API type definitions module
// Request bodies and response envelopes of the geometry endpoints

use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::buffer::DEFAULT_DISTANCE_M;
use crate::geometry::simplify::DEFAULT_TOLERANCE;
use crate::geometry::Statistics;

pub const STATUS_SUCCESS: &str = "success";

// ============== Requests ==============

// Geometry members stay raw JSON so an absent member reports as missing
// instead of failing deserialization of the whole body.

#[derive(Debug, Deserialize)]
pub struct BufferRequest {
    pub geometry: Option<Value>,
    #[serde(default = "default_distance")]
    pub distance: f64,
}

#[derive(Debug, Deserialize)]
pub struct SimplifyRequest {
    pub geometry: Option<Value>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Deserialize)]
pub struct IntersectionRequest {
    pub geometry1: Option<Value>,
    pub geometry2: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub geojson: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct VoronoiRequest {
    pub points: Option<Vec<Vec<f64>>>,
}

const fn default_distance() -> f64 {
    DEFAULT_DISTANCE_M
}

const fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

// ============== Responses ==============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BufferResponse {
    pub status: &'static str,
    pub buffer: FeatureCollection,
}

#[derive(Debug, Serialize)]
pub struct SimplifyResponse {
    pub status: &'static str,
    pub simplified: FeatureCollection,
}

/// `intersection` is `null` when the inputs are disjoint
#[derive(Debug, Serialize)]
pub struct IntersectionResponse {
    pub status: &'static str,
    pub intersects: bool,
    pub intersection: Option<FeatureCollection>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    pub statistics: Statistics,
}

/// `data` is a FeatureCollection or an array of WKT strings
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub status: &'static str,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct VoronoiResponse {
    pub status: &'static str,
    pub voronoi: FeatureCollection,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}
