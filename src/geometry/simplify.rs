//! Ramer-Douglas-Peucker simplification in the input CRS

use geo::{CoordsIter, Geometry, GeometryCollection, Simplify};

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_TOLERANCE: f64 = 0.0001;

/// Simplify with the given tolerance; points pass through unchanged
pub fn simplify(geometry: &Geometry<f64>, tolerance: f64) -> ApiResult<Geometry<f64>> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ApiError::InvalidParameter(
            "tolerance must be a non-negative number".to_string(),
        ));
    }
    Ok(simplify_geometry(geometry, tolerance))
}

fn simplify_geometry(geometry: &Geometry<f64>, epsilon: f64) -> Geometry<f64> {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) | Geometry::Line(_) => geometry.clone(),
        Geometry::LineString(ls) => ls.simplify(epsilon).into(),
        Geometry::MultiLineString(mls) => mls.simplify(epsilon).into(),
        Geometry::Polygon(p) => p.simplify(epsilon).into(),
        Geometry::MultiPolygon(mp) => mp.simplify(epsilon).into(),
        Geometry::Rect(r) => r.to_polygon().simplify(epsilon).into(),
        Geometry::Triangle(t) => t.to_polygon().simplify(epsilon).into(),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(
            gc.iter()
                .map(|g| simplify_geometry(g, epsilon))
                .collect::<GeometryCollection<f64>>(),
        ),
    }
}

/// Vertex count of the line work, used in debug logs
pub fn vertex_count(geometry: &Geometry<f64>) -> usize {
    geometry.coords_count()
}
