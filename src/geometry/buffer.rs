//! Metric buffer around a geographic geometry

use geo::{Buffer, Geometry, MultiPolygon};

use super::{collapse_polygons, WebMercator};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_DISTANCE_M: f64 = 100.0;

/// Buffer `geometry` (EPSG:4326) by `distance` meters measured in Web Mercator
pub fn buffer_meters(geometry: &Geometry<f64>, distance: f64) -> ApiResult<Geometry<f64>> {
    if !distance.is_finite() {
        return Err(ApiError::InvalidParameter(
            "distance must be a finite number".to_string(),
        ));
    }
    let projection = WebMercator::new()?;
    let planar = projection.to_planar(geometry)?;
    let buffered = planar_buffer(&planar, distance);
    let geographic = projection.to_geographic(&buffered)?;
    Ok(collapse_polygons(geographic))
}

pub fn planar_buffer(geometry: &Geometry<f64>, distance: f64) -> MultiPolygon<f64> {
    geometry.buffer(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon, Area};
    use std::f64::consts::PI;

    fn relative_error(actual: f64, expected: f64) -> f64 {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn test_planar_point_buffer_area() {
        let circle = planar_buffer(&point!(x: 500.0, y: -200.0).into(), 100.0);
        let expected = PI * 100.0 * 100.0;
        assert!(relative_error(circle.unsigned_area(), expected) < 0.02);
    }

    #[test]
    fn test_geographic_point_buffer_area() {
        let geometry: Geometry<f64> = point!(x: 10.75, y: 59.91).into();
        let buffered = buffer_meters(&geometry, 100.0).unwrap();
        assert!(matches!(buffered, Geometry::Polygon(_)));

        // measured back in the projection the buffer was built in
        let planar = WebMercator::new().unwrap().to_planar(&buffered).unwrap();
        let expected = PI * 100.0 * 100.0;
        assert!(relative_error(planar.unsigned_area(), expected) < 0.02);
    }

    #[test]
    fn test_negative_distance_shrinks_polygon() {
        let square: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 1000.0, y: 0.0),
            (x: 1000.0, y: 1000.0),
            (x: 0.0, y: 1000.0),
            (x: 0.0, y: 0.0),
        ]
        .into();
        let shrunk = planar_buffer(&square, -100.0);
        assert!(relative_error(shrunk.unsigned_area(), 800.0 * 800.0) < 1e-3);
    }

    #[test]
    fn test_rejects_non_finite_distance() {
        let geometry: Geometry<f64> = point!(x: 0.0, y: 0.0).into();
        assert!(matches!(
            buffer_meters(&geometry, f64::NAN),
            Err(ApiError::InvalidParameter(_))
        ));
    }
}
