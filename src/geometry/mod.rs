//! Geometry operations behind the API endpoints
//!
//! Each operation is a short, fixed sequence of library calls: `geo` for the
//! planar algorithms, `proj` for reprojection, `spade` for the Delaunay /
//! Voronoi structure, `geojson` and `wkt` for encodings.

pub mod buffer;
pub mod codec;
pub mod convert;
pub mod intersection;
pub mod projection;
pub mod simplify;
pub mod stats;
pub mod voronoi;

use geo::{Geometry, MultiPolygon};

pub use buffer::buffer_meters;
pub use codec::{parse_features, parse_geometry, single_feature_collection};
pub use convert::{convert_upload, OutputFormat};
pub use intersection::intersection;
pub use projection::WebMercator;
pub use simplify::simplify;
pub use stats::{analyze, Statistics};
pub use voronoi::voronoi;

/// A single polygon stays a Polygon, anything else a MultiPolygon
pub fn collapse_polygons(mut polygons: MultiPolygon<f64>) -> Geometry<f64> {
    if polygons.0.len() == 1 {
        if let Some(polygon) = polygons.0.pop() {
            return Geometry::Polygon(polygon);
        }
    }
    Geometry::MultiPolygon(polygons)
}
