//! Summary statistics over a feature collection
//!
//! Areas and lengths are measured in Web Mercator, over polygonal and linear
//! features respectively. Aggregates over an empty set are NaN, which JSON
//! encodes as `null`.

use std::collections::BTreeMap;

use geo::{Area, BoundingRect, Euclidean, Geometry, Length};
use serde::Serialize;

use super::codec::{type_name, union_bounds, ParsedFeature};
use super::WebMercator;
use crate::error::ApiResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    #[allow(clippy::cast_precision_loss)]
    pub fn of(values: &[f64]) -> Self {
        let total: f64 = values.iter().sum();
        Self {
            total,
            mean: total / values.len() as f64,
            min: values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN),
            max: values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Statistics {
    pub feature_count: usize,
    pub geometry_types: BTreeMap<&'static str, usize>,
    pub properties: Vec<String>,
    /// `[minx, miny, maxx, maxy]`
    pub bounds: [f64; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_area_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_area_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_area_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_area_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_length_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_length_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length_m: Option<f64>,
}

impl Statistics {
    fn set_area(&mut self, s: Summary) {
        self.total_area_m2 = Some(s.total);
        self.mean_area_m2 = Some(s.mean);
        self.min_area_m2 = Some(s.min);
        self.max_area_m2 = Some(s.max);
    }

    fn set_length(&mut self, s: Summary) {
        self.total_length_m = Some(s.total);
        self.mean_length_m = Some(s.mean);
        self.min_length_m = Some(s.min);
        self.max_length_m = Some(s.max);
    }
}

/// Property names in first-seen order across all features
fn property_names(features: &[ParsedFeature]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for feature in features {
        for key in feature.properties.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }
    names
}

/// Euclidean length of the line work, in the units of the coordinates
fn planar_length(geometry: &Geometry<f64>) -> f64 {
    match geometry {
        Geometry::Line(l) => Euclidean.length(l),
        Geometry::LineString(ls) => Euclidean.length(ls),
        Geometry::MultiLineString(mls) => Euclidean.length(mls),
        _ => 0.0,
    }
}

/// Geometries whose reported type is one of `kinds`
fn of_kind<'a>(geometries: &[&'a Geometry<f64>], kinds: &[&str]) -> Vec<&'a Geometry<f64>> {
    geometries
        .iter()
        .copied()
        .filter(|g| kinds.contains(&type_name(g)))
        .collect()
}

pub fn analyze(features: &[ParsedFeature]) -> ApiResult<Statistics> {
    let geometries: Vec<&Geometry<f64>> = features.iter().filter_map(|f| f.geometry.as_ref()).collect();

    let mut geometry_types = BTreeMap::new();
    for g in &geometries {
        *geometry_types.entry(type_name(g)).or_insert(0) += 1;
    }

    let mut stats = Statistics {
        feature_count: features.len(),
        properties: property_names(features),
        bounds: union_bounds(geometries.iter().filter_map(|g| g.bounding_rect()))
            .unwrap_or([f64::NAN; 4]),
        geometry_types,
        total_area_m2: None,
        mean_area_m2: None,
        min_area_m2: None,
        max_area_m2: None,
        total_length_m: None,
        mean_length_m: None,
        min_length_m: None,
        max_length_m: None,
    };

    let polygonal = of_kind(&geometries, &["Polygon", "MultiPolygon"]);
    let linear = of_kind(&geometries, &["LineString", "MultiLineString"]);

    if polygonal.is_empty() && linear.is_empty() {
        return Ok(stats);
    }

    let projection = WebMercator::new()?;

    if !polygonal.is_empty() {
        let areas = polygonal
            .iter()
            .map(|g| projection.to_planar(*g).map(|p| p.unsigned_area()))
            .collect::<ApiResult<Vec<f64>>>()?;
        stats.set_area(Summary::of(&areas));
    }

    if !linear.is_empty() {
        let lengths = linear
            .iter()
            .map(|g| projection.to_planar(*g).map(|p| planar_length(&p)))
            .collect::<ApiResult<Vec<f64>>>()?;
        stats.set_length(Summary::of(&lengths));
    }

    Ok(stats)
}
