//! Geographic <-> Web Mercator reprojection
//!
//! Metric operations run in EPSG:3857 (Web Mercator); requests and responses
//! use EPSG:4326 lon/lat. Both directions are PROJ pipelines, so no CRS
//! database lookup is involved.

use geo::{Coord, MapCoords};
use proj::Proj;

use crate::error::{ApiError, ApiResult};

/// EPSG:4326 degrees -> EPSG:3857 meters
const TO_WEB_MERCATOR: &str =
    "+proj=pipeline +step +proj=unitconvert +xy_in=deg +xy_out=rad +step +proj=webmerc +ellps=WGS84";

/// EPSG:3857 meters -> EPSG:4326 degrees
const FROM_WEB_MERCATOR: &str =
    "+proj=pipeline +step +inv +proj=webmerc +ellps=WGS84 +step +proj=unitconvert +xy_in=rad +xy_out=deg";

/// Request-local pair of PROJ transformations
pub struct WebMercator {
    forward: Proj,
    inverse: Proj,
}

impl WebMercator {
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            forward: Proj::new(TO_WEB_MERCATOR)?,
            inverse: Proj::new(FROM_WEB_MERCATOR)?,
        })
    }

    /// Geographic -> planar (meters)
    pub fn to_planar<G>(&self, geometry: &G) -> ApiResult<G::Output>
    where
        G: MapCoords<f64, f64>,
    {
        transform(&self.forward, geometry)
    }

    /// Planar (meters) -> geographic
    pub fn to_geographic<G>(&self, geometry: &G) -> ApiResult<G::Output>
    where
        G: MapCoords<f64, f64>,
    {
        transform(&self.inverse, geometry)
    }
}

fn transform<G>(proj: &Proj, geometry: &G) -> ApiResult<G::Output>
where
    G: MapCoords<f64, f64>,
{
    geometry.try_map_coords(|c: Coord<f64>| -> ApiResult<Coord<f64>> {
        let (x, y) = proj.convert((c.x, c.y))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(ApiError::Projection(format!(
                "({}, {}) has no finite image",
                c.x, c.y
            )));
        }
        Ok(Coord { x, y })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Point};

    /// Half the Web Mercator world width in meters
    const HALF_WORLD: f64 = 20_037_508.342_789_244;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps {eps})");
    }

    #[test]
    fn test_known_points() {
        let wm = WebMercator::new().unwrap();

        let origin: Point<f64> = wm.to_planar(&point!(x: 0.0, y: 0.0)).unwrap();
        assert_close(origin.x(), 0.0, 1e-6);
        assert_close(origin.y(), 0.0, 1e-6);

        let east: Point<f64> = wm.to_planar(&point!(x: 180.0, y: 0.0)).unwrap();
        assert_close(east.x(), HALF_WORLD, 1e-3);

        let north: Point<f64> = wm.to_planar(&point!(x: 0.0, y: 85.051_128_779_806_59)).unwrap();
        assert_close(north.y(), HALF_WORLD, 1.0);
    }

    #[test]
    fn test_round_trip() {
        let wm = WebMercator::new().unwrap();
        let oslo = point!(x: 10.7522, y: 59.9139);
        let planar = wm.to_planar(&oslo).unwrap();
        let back = wm.to_geographic(&planar).unwrap();
        assert_close(back.x(), oslo.x(), 1e-9);
        assert_close(back.y(), oslo.y(), 1e-9);
    }

    #[test]
    fn test_pole_is_rejected() {
        let wm = WebMercator::new().unwrap();
        assert!(matches!(
            wm.to_planar(&point!(x: 0.0, y: 90.0)),
            Err(ApiError::Projection(_))
        ));
    }
}
