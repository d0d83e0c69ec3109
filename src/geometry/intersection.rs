//! Intersection of two arbitrary geometries
//!
//! `geo` offers boolean operations for polygonal inputs and clipping of line
//! work by polygons. Mixed inputs are split into point, line and polygon
//! parts, each pair handled by the matching library call, and the pieces
//! reassembled into the simplest geometry that holds them.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{
    Area, BooleanOps, Euclidean, Geometry, GeometryCollection, Intersects, Length, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};

use super::collapse_polygons;

#[derive(Debug, Default)]
struct Parts {
    points: Vec<Point<f64>>,
    lines: Vec<LineString<f64>>,
    polygons: Vec<Polygon<f64>>,
}

impl Parts {
    fn of(geometry: &Geometry<f64>) -> Self {
        let mut parts = Self::default();
        parts.push(geometry);
        parts
    }

    fn push(&mut self, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.points.push(*p),
            Geometry::MultiPoint(mp) => self.points.extend(mp.iter().copied()),
            Geometry::Line(l) => self.lines.push(LineString::from(vec![l.start, l.end])),
            Geometry::LineString(ls) => self.lines.push(ls.clone()),
            Geometry::MultiLineString(mls) => self.lines.extend(mls.iter().cloned()),
            Geometry::Polygon(p) => self.polygons.push(p.clone()),
            Geometry::MultiPolygon(mp) => self.polygons.extend(mp.iter().cloned()),
            Geometry::Rect(r) => self.polygons.push(r.to_polygon()),
            Geometry::Triangle(t) => self.polygons.push(t.to_polygon()),
            Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| self.push(g)),
        }
    }

    fn push_point(&mut self, point: Point<f64>) {
        if !self.points.contains(&point) {
            self.points.push(point);
        }
    }

    fn push_line(&mut self, line: LineString<f64>) {
        let reversed: Vec<_> = line.0.iter().rev().copied().collect();
        if !self.lines.iter().any(|l| *l == line || l.0 == reversed) {
            self.lines.push(line);
        }
    }

    /// A point lying on a line or polygon of the result adds nothing to it
    fn drop_covered_points(&mut self) {
        let (lines, polygons) = (&self.lines, &self.polygons);
        self.points.retain(|p| {
            !lines.iter().any(|l| p.intersects(l)) && !polygons.iter().any(|g| p.intersects(g))
        });
    }

    fn multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.polygons.clone())
    }

    /// Single part -> Point / LineString / Polygon, several of one kind ->
    /// Multi*, mixed kinds -> GeometryCollection
    fn into_geometry(self) -> Geometry<f64> {
        let mut kinds: Vec<Geometry<f64>> = Vec::with_capacity(3);
        if !self.points.is_empty() {
            kinds.push(if self.points.len() == 1 {
                Geometry::Point(self.points[0])
            } else {
                Geometry::MultiPoint(MultiPoint::new(self.points))
            });
        }
        if !self.lines.is_empty() {
            let mut lines = self.lines;
            kinds.push(if lines.len() == 1 {
                Geometry::LineString(lines.remove(0))
            } else {
                Geometry::MultiLineString(MultiLineString::new(lines))
            });
        }
        if !self.polygons.is_empty() {
            kinds.push(collapse_polygons(MultiPolygon::new(self.polygons)));
        }
        if kinds.len() == 1 {
            if let Some(only) = kinds.pop() {
                return only;
            }
        }
        Geometry::GeometryCollection(GeometryCollection::from(kinds))
    }
}

/// Exterior and interior rings of a polygon
fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

/// Points and overlapping stretches shared by two pieces of line work
fn line_contacts(a: &LineString<f64>, b: &LineString<f64>, out: &mut Parts) {
    for sa in a.lines() {
        for sb in b.lines() {
            match line_intersection(sa, sb) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    out.push_point(intersection.into());
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    out.push_line(LineString::from(vec![intersection.start, intersection.end]));
                }
                None => {}
            }
        }
    }
}

/// Contacts between line work and the boundary of a polygon
fn boundary_contacts(line: &LineString<f64>, polygon: &Polygon<f64>, out: &mut Parts) {
    for ring in rings(polygon) {
        line_contacts(line, ring, out);
    }
}

/// Line work of `lines` inside `polygons`, or where it only touches them,
/// the shared boundary points and stretches
fn clip_lines(lines: &[LineString<f64>], polygons: &[Polygon<f64>], out: &mut Parts) {
    if lines.is_empty() || polygons.is_empty() {
        return;
    }
    let area = MultiPolygon::new(polygons.to_vec());
    for line in lines {
        let clipped: Vec<LineString<f64>> = area
            .clip(&MultiLineString::new(vec![line.clone()]), false)
            .0
            .into_iter()
            .filter(|ls| Euclidean.length(ls) > 0.0)
            .collect();
        if clipped.is_empty() {
            for polygon in polygons.iter().filter(|p| p.intersects(line)) {
                boundary_contacts(line, polygon, out);
            }
        } else {
            clipped.into_iter().for_each(|ls| out.push_line(ls));
        }
    }
}

/// `None` when the geometries do not intersect
pub fn intersection(a: &Geometry<f64>, b: &Geometry<f64>) -> Option<Geometry<f64>> {
    if !a.intersects(b) {
        return None;
    }

    let left = Parts::of(a);
    let right = Parts::of(b);
    let mut out = Parts::default();

    if !left.polygons.is_empty() && !right.polygons.is_empty() {
        let area = left.multi_polygon().intersection(&right.multi_polygon());
        out.polygons
            .extend(area.0.into_iter().filter(|p| p.unsigned_area() > 0.0));

        // polygons that meet only along their boundaries
        for pa in &left.polygons {
            for pb in right.polygons.iter().filter(|pb| pa.intersects(*pb)) {
                if pa.intersection(pb).unsigned_area() > 0.0 {
                    continue;
                }
                for ring in rings(pa) {
                    boundary_contacts(ring, pb, &mut out);
                }
            }
        }
    }

    clip_lines(&left.lines, &right.polygons, &mut out);
    clip_lines(&right.lines, &left.polygons, &mut out);

    for la in &left.lines {
        for lb in &right.lines {
            line_contacts(la, lb, &mut out);
        }
    }

    for p in &left.points {
        if p.intersects(b) {
            out.push_point(*p);
        }
    }
    for p in &right.points {
        if p.intersects(a) {
            out.push_point(*p);
        }
    }

    out.drop_covered_points();
    Some(out.into_geometry())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]
        .into()
    }

    #[test]
    fn test_disjoint() {
        assert!(intersection(&square(0.0, 0.0, 1.0), &square(5.0, 5.0, 1.0)).is_none());
    }

    #[test]
    fn test_identical_polygons() {
        let a = square(0.0, 0.0, 2.0);
        let result = intersection(&a, &a).unwrap();
        assert!(matches!(result, Geometry::Polygon(_)));
        assert!((result.unsigned_area() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_polygons() {
        let result = intersection(&square(0.0, 0.0, 2.0), &square(1.0, 1.0, 2.0)).unwrap();
        assert!((result.unsigned_area() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_line_through_polygon() {
        let line: Geometry<f64> = line_string![(x: -1.0, y: 0.5), (x: 3.0, y: 0.5)].into();
        let result = intersection(&line, &square(0.0, 0.0, 1.0)).unwrap();
        let Geometry::LineString(ls) = result else {
            panic!("expected a line string");
        };
        let xs: Vec<f64> = ls.coords().map(|c| c.x).collect();
        assert!((xs.iter().copied().fold(f64::INFINITY, f64::min) - 0.0).abs() < 1e-6);
        assert!((xs.iter().copied().fold(f64::NEG_INFINITY, f64::max) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_crossing_lines() {
        let a: Geometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0)].into();
        let b: Geometry<f64> = line_string![(x: 0.0, y: 2.0), (x: 2.0, y: 0.0)].into();
        assert_eq!(intersection(&a, &b), Some(point!(x: 1.0, y: 1.0).into()));
    }

    /// Endpoints of a single line string, in ascending order
    fn endpoints(geometry: &Geometry<f64>) -> Vec<(f64, f64)> {
        let Geometry::LineString(ls) = geometry else {
            panic!("expected a line string, got {geometry:?}");
        };
        let mut ends = vec![ls.0[0].x_y(), ls.0[ls.0.len() - 1].x_y()];
        ends.sort_by(|a, b| a.partial_cmp(b).unwrap());
        ends
    }

    #[test]
    fn test_polygons_sharing_an_edge() {
        let result = intersection(&square(0.0, 0.0, 1.0), &square(1.0, 0.0, 1.0)).unwrap();
        assert_eq!(endpoints(&result), vec![(1.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_polygons_sharing_a_corner() {
        let result = intersection(&square(0.0, 0.0, 1.0), &square(1.0, 1.0, 1.0));
        assert_eq!(result, Some(point!(x: 1.0, y: 1.0).into()));
    }

    #[test]
    fn test_line_touching_polygon_vertex() {
        let line: Geometry<f64> = line_string![(x: 0.0, y: 2.0), (x: 2.0, y: 0.0)].into();
        let result = intersection(&square(0.0, 0.0, 1.0), &line);
        assert_eq!(result, Some(point!(x: 1.0, y: 1.0).into()));
    }

    #[test]
    fn test_collinear_lines_overlap() {
        let a: Geometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0)].into();
        let b: Geometry<f64> = line_string![(x: 1.0, y: 0.0), (x: 3.0, y: 0.0)].into();
        let result = intersection(&a, &b).unwrap();
        assert_eq!(endpoints(&result), vec![(1.0, 0.0), (2.0, 0.0)]);
    }

    #[test]
    fn test_point_in_polygon() {
        let p: Geometry<f64> = point!(x: 0.5, y: 0.5).into();
        assert_eq!(intersection(&square(0.0, 0.0, 1.0), &p), Some(p.clone()));
    }
}
