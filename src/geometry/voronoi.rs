//! Voronoi tessellation of a point set
//!
//! Sites are triangulated in Web Mercator with `spade`; each Voronoi face of
//! the triangulation belongs to exactly one Delaunay vertex, and that vertex
//! carries the index of the request point that generated it. Faces reaching
//! an outer (infinite) Voronoi vertex are unbounded and dropped. The bounded
//! ones are clipped to the site extent grown by 20% on every side.

use geo::{BooleanOps, Coord, Geometry, LineString, Point, Polygon, Rect};
use geojson::{FeatureCollection, JsonObject};
use serde_json::json;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use super::codec::{feature_collection, ParsedFeature};
use super::{collapse_polygons, WebMercator};
use crate::error::{ApiError, ApiResult};

/// Margin added around the site extent, as a fraction of its width/height
const CLIP_MARGIN: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
struct Site {
    position: Point2<f64>,
    index: usize,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCell {
    /// Position of the generating point in the input
    pub site_index: usize,
    pub cell: Geometry<f64>,
}

fn clip_boundary(sites: &[Coord<f64>]) -> Polygon<f64> {
    let (mut min, mut max) = (sites[0], sites[0]);
    for c in &sites[1..] {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        max.x = max.x.max(c.x);
        max.y = max.y.max(c.y);
    }
    let dx = (max.x - min.x) * CLIP_MARGIN;
    let dy = (max.y - min.y) * CLIP_MARGIN;
    Rect::new(
        Coord { x: min.x - dx, y: min.y - dy },
        Coord { x: max.x + dx, y: max.y + dy },
    )
    .to_polygon()
}

/// Bounded, clipped Voronoi cells of planar sites, ordered by site index.
/// A repeated site keeps the index of its first occurrence.
pub fn planar_cells(sites: &[Coord<f64>]) -> ApiResult<Vec<VoronoiCell>> {
    let mut triangulation: DelaunayTriangulation<Site> = DelaunayTriangulation::new();
    for (index, c) in sites.iter().enumerate() {
        let position = Point2::new(c.x, c.y);
        if triangulation.locate_vertex(position).is_some() {
            continue;
        }
        triangulation
            .insert(Site { position, index })
            .map_err(|e| ApiError::InvalidGeometry(format!("point {index}: {e:?}")))?;
    }

    // no triangle means fewer than three sites or all of them on one line
    if triangulation.num_inner_faces() == 0 {
        return Err(ApiError::InsufficientPoints);
    }

    let boundary = clip_boundary(sites);
    let mut cells = Vec::new();

    for face in triangulation.voronoi_faces() {
        let ring: Option<Vec<Coord<f64>>> = face
            .adjacent_edges()
            .map(|edge| edge.from().position().map(|p| Coord { x: p.x, y: p.y }))
            .collect();
        let Some(ring) = ring else {
            continue;
        };
        if ring.len() < 3 {
            continue;
        }

        let clipped = Polygon::new(LineString::from(ring), vec![]).intersection(&boundary);
        if clipped.0.is_empty() {
            continue;
        }
        cells.push(VoronoiCell {
            site_index: face.as_delaunay_vertex().data().index,
            cell: collapse_polygons(clipped),
        });
    }

    cells.sort_by_key(|c| c.site_index);
    Ok(cells)
}

/// Tessellate `[lon, lat]` points; every cell feature carries its site
pub fn voronoi(points: &[Vec<f64>]) -> ApiResult<FeatureCollection> {
    let sites = points
        .iter()
        .enumerate()
        .map(|(i, p)| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err(ApiError::InvalidParameter(format!(
                "point {i} needs at least two finite numbers"
            ))),
        })
        .collect::<ApiResult<Vec<Coord<f64>>>>()?;

    if sites.len() < 3 {
        return Err(ApiError::InsufficientPoints);
    }

    let projection = WebMercator::new()?;
    let planar = sites
        .iter()
        .map(|c| projection.to_planar(&Point::from(*c)).map(|p| p.0))
        .collect::<ApiResult<Vec<Coord<f64>>>>()?;

    let features = planar_cells(&planar)?
        .into_iter()
        .map(|cell| {
            let site = sites[cell.site_index];
            let mut properties = JsonObject::new();
            properties.insert("site_index".to_string(), json!(cell.site_index));
            properties.insert("site".to_string(), json!([site.x, site.y]));
            Ok(ParsedFeature {
                geometry: Some(projection.to_geographic(&cell.cell)?),
                properties,
            })
        })
        .collect::<ApiResult<Vec<ParsedFeature>>>()?;

    Ok(feature_collection(&features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, BoundingRect, Intersects};

    fn coords(points: &[(f64, f64)]) -> Vec<Coord<f64>> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    #[test]
    fn test_square_with_center() {
        let sites = coords(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (1.0, 1.0)]);
        let cells = planar_cells(&sites).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].site_index, 4);
        assert!((cells[0].cell.unsigned_area() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_hull_sites_are_unbounded() {
        let sites = coords(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert!(planar_cells(&sites).unwrap().is_empty());
    }

    #[test]
    fn test_cells_do_not_overlap() {
        let sites = coords(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (1.0, 1.5),
            (3.0, 2.5),
        ]);
        let cells = planar_cells(&sites).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].site_index, 4);
        assert_eq!(cells[1].site_index, 5);
        let (Geometry::Polygon(a), Geometry::Polygon(b)) = (&cells[0].cell, &cells[1].cell) else {
            panic!("expected polygons");
        };
        assert!(a.intersection(b).unsigned_area() < 1e-6);
    }

    #[test]
    fn test_cell_clipped_to_margin() {
        let sites = coords(&[(-10.0, 0.0), (10.0, 0.0), (0.0, 1.0), (0.0, 0.2)]);
        let cells = planar_cells(&sites).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].site_index, 3);
        let rect = cells[0].cell.bounding_rect().unwrap();
        assert!((rect.min().y - -0.2).abs() < 1e-5, "{rect:?}");
        assert!(rect.max().y <= 1.2 + 1e-5);
    }

    #[test]
    fn test_duplicates_keep_first_index() {
        let sites = coords(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (1.0, 1.0),
            (2.0, 2.0),
            (0.0, 2.0),
            (1.0, 1.0),
        ]);
        let cells = planar_cells(&sites).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].site_index, 2);
    }

    #[test]
    fn test_insufficient_points() {
        let two = coords(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(planar_cells(&two), Err(ApiError::InsufficientPoints)));

        let collinear = coords(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert!(matches!(
            planar_cells(&collinear),
            Err(ApiError::InsufficientPoints)
        ));

        assert!(matches!(
            voronoi(&[vec![0.0, 0.0], vec![1.0, 1.0]]),
            Err(ApiError::InsufficientPoints)
        ));
    }

    #[test]
    fn test_short_point_rejected() {
        let points = vec![vec![0.0, 0.0], vec![1.0], vec![1.0, 1.0]];
        assert!(matches!(
            voronoi(&points),
            Err(ApiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_geographic_features() {
        let points = vec![
            vec![10.0, 59.0],
            vec![10.2, 59.0],
            vec![10.2, 59.2],
            vec![10.0, 59.2],
            vec![10.1, 59.1],
        ];
        let fc = voronoi(&points).unwrap();
        assert_eq!(fc.features.len(), 1);
        let feature = &fc.features[0];
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["site_index"], 4);
        assert_eq!(properties["site"], json!([10.1, 59.1]));

        let cell = Geometry::<f64>::try_from(feature.geometry.clone().unwrap()).unwrap();
        let site = Geometry::Point(geo::point!(x: 10.1, y: 59.1));
        assert!(cell.intersects(&site));
    }
}
