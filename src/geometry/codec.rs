//! GeoJSON decoding and encoding
//!
//! Requests carry GeoJSON; the operations work on `geo` types. Everything
//! crossing that boundary goes through here.

use geo::{BoundingRect, CoordsIter, Geometry, Rect};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// One decoded feature: optional geometry plus its property map
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: JsonObject,
}

/// Decode a geometry payload. A Feature is accepted and its geometry used.
pub fn parse_geometry(value: Value) -> ApiResult<Geometry<f64>> {
    let geometry = match GeoJson::from_json_value(value)? {
        GeoJson::Geometry(g) => g,
        GeoJson::Feature(f) => f
            .geometry
            .ok_or_else(|| ApiError::InvalidGeometry("feature has no geometry".to_string()))?,
        GeoJson::FeatureCollection(_) => {
            return Err(ApiError::InvalidGeometry(
                "expected a geometry, got a FeatureCollection".to_string(),
            ))
        }
    };
    from_geojson(geometry)
}

/// Convert a GeoJSON geometry, rejecting non-finite coordinates
pub fn from_geojson(geometry: geojson::Geometry) -> ApiResult<Geometry<f64>> {
    let geometry = Geometry::<f64>::try_from(geometry)?;
    if geometry
        .coords_iter()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(ApiError::InvalidGeometry(
            "coordinates must be finite numbers".to_string(),
        ));
    }
    Ok(geometry)
}

/// Decode `{"features": [...]}`. The `type` member is not required and a
/// feature's geometry may be null.
pub fn parse_features(collection: &Value) -> ApiResult<Vec<ParsedFeature>> {
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or(ApiError::MissingInput("geojson.features"))?;

    features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            parse_feature(feature)
                .map_err(|e| ApiError::InvalidGeometry(format!("feature {i}: {}", inner_message(e))))
        })
        .collect()
}

fn parse_feature(feature: &Value) -> ApiResult<ParsedFeature> {
    let geometry = match feature.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => {
            let geometry: geojson::Geometry = serde_json::from_value(g.clone())
                .map_err(|e| ApiError::InvalidGeometry(e.to_string()))?;
            Some(from_geojson(geometry)?)
        }
    };
    let properties = match feature.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        _ => JsonObject::new(),
    };
    Ok(ParsedFeature {
        geometry,
        properties,
    })
}

fn inner_message(e: ApiError) -> String {
    match e {
        ApiError::InvalidGeometry(msg) => msg,
        other => other.to_string(),
    }
}

/// GeoJSON type name of a geometry; `Line`, `Rect` and `Triangle` report the
/// type they are encoded as.
pub const fn type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

/// `[minx, miny, maxx, maxy]` of a set of rectangles
pub fn union_bounds<I>(rects: I) -> Option<[f64; 4]>
where
    I: IntoIterator<Item = Rect<f64>>,
{
    rects.into_iter().fold(None, |acc, rect| {
        let (min, max) = (rect.min(), rect.max());
        Some(match acc {
            None => [min.x, min.y, max.x, max.y],
            Some([x0, y0, x1, y1]) => [x0.min(min.x), y0.min(min.y), x1.max(max.x), y1.max(max.y)],
        })
    })
}

fn bbox_of(geometry: &Geometry<f64>) -> Option<Vec<f64>> {
    geometry
        .bounding_rect()
        .map(|r| vec![r.min().x, r.min().y, r.max().x, r.max().y])
}

fn to_feature(index: usize, geometry: Option<&Geometry<f64>>, properties: JsonObject) -> Feature {
    Feature {
        bbox: geometry.and_then(bbox_of),
        geometry: geometry.map(|g| geojson::Geometry::new(geojson::Value::from(g))),
        id: Some(geojson::feature::Id::String(index.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Encode features as a FeatureCollection with ids `"0".."n-1"`
pub fn feature_collection(features: &[ParsedFeature]) -> FeatureCollection {
    let bbox = union_bounds(
        features
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(|g| g.bounding_rect())),
    );
    FeatureCollection {
        bbox: bbox.map(Vec::from),
        features: features
            .iter()
            .enumerate()
            .map(|(i, f)| to_feature(i, f.geometry.as_ref(), f.properties.clone()))
            .collect(),
        foreign_members: None,
    }
}

/// Encode one geometry as a single-feature collection
pub fn single_feature_collection(geometry: &Geometry<f64>) -> FeatureCollection {
    FeatureCollection {
        bbox: bbox_of(geometry),
        features: vec![to_feature(0, Some(geometry), JsonObject::new())],
        foreign_members: None,
    }
}
