//! Nearest-element queries in world coordinates.
//!
//! Every query takes a world-space tolerance and reports the closest
//! candidate strictly inside it. Planar shapes report distance zero when the
//! point lies inside them.

use super::Document;
use crate::elements::{ElementRef, Load, LoadKind, Member, Node, Support, Surface, SurfaceGeometry, SurfaceKind};
use crate::geometry::{
    distance_point_to_segment, distance_to_polygon_edges, offset_polygon_outward, point_in_polygon,
    rect_contains_inclusive,
};
use kurbo::{Point, Vec2};

/// Keep the candidate with the smallest distance below `tolerance`.
/// Earlier candidates win ties.
fn nearest<T>(candidates: impl Iterator<Item = (T, f64)>, tolerance: f64) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for (item, dist) in candidates {
        let limit = best.as_ref().map_or(tolerance, |(_, d)| *d);
        if dist < limit {
            best = Some((item, dist));
        }
    }
    best.map(|(item, _)| item)
}

/// Distance from `p` to a surface as drawn. Walls are displayed shifted by
/// `wall_offset` along both axes; exterior-wall polygons are drawn as their
/// mitered outward offset and only their outline is pickable.
pub(crate) fn surface_distance(surface: &Surface, p: Point, wall_offset: f64) -> f64 {
    let shift = if surface.kind.is_wall() {
        Vec2::new(wall_offset, wall_offset)
    } else {
        Vec2::ZERO
    };
    match &surface.geometry {
        SurfaceGeometry::Rect(rect) => {
            if rect_contains_inclusive(*rect + shift, p) {
                0.0
            } else {
                f64::INFINITY
            }
        }
        SurfaceGeometry::Line { start, end } => distance_point_to_segment(p, *start + shift, *end + shift),
        SurfaceGeometry::Polygon(points) if surface.kind == SurfaceKind::ExteriorWall => {
            distance_to_polygon_edges(p, &offset_polygon_outward(points, wall_offset))
        }
        SurfaceGeometry::Polygon(points) => {
            let shifted: Vec<Point> = points.iter().map(|pt| *pt + shift).collect();
            if point_in_polygon(p, &shifted) {
                0.0
            } else {
                f64::INFINITY
            }
        }
    }
}

fn load_distance(load: &Load, p: Point) -> f64 {
    match &load.kind {
        LoadKind::Area { rect, .. } => {
            if rect_contains_inclusive(*rect, p) {
                0.0
            } else {
                f64::INFINITY
            }
        }
        LoadKind::Line { start, end, .. } => distance_point_to_segment(p, *start, *end),
        LoadKind::Point { at, .. } => at.distance(p),
    }
}

impl Document {
    pub fn find_node_at(&self, p: Point, tolerance: f64) -> Option<&Node> {
        self.find_node_at_excluding(p, tolerance, None)
    }

    /// Like [`find_node_at`](Self::find_node_at) but ignoring one node, used
    /// while that node is being dragged.
    pub fn find_node_at_excluding(&self, p: Point, tolerance: f64, exclude: Option<&str>) -> Option<&Node> {
        let candidates = self
            .nodes
            .iter()
            .filter(|n| Some(n.id.as_str()) != exclude)
            .map(|n| (n, n.position.distance(p)));
        nearest(candidates, tolerance)
    }

    pub fn find_member_at(&self, p: Point, tolerance: f64) -> Option<&Member> {
        let candidates = self.members.iter().filter_map(|m| {
            let (a, b) = self.member_endpoints(m)?;
            Some((m, distance_point_to_segment(p, a, b)))
        });
        nearest(candidates, tolerance)
    }

    /// Most recently added surface wins when several contain the point.
    pub fn find_surface_at(&self, p: Point, tolerance: f64) -> Option<&Surface> {
        let offset = self.settings.effective_wall_offset();
        let candidates = self.surfaces.iter().rev().map(|s| (s, surface_distance(s, p, offset)));
        nearest(candidates, tolerance)
    }

    pub fn find_load_at(&self, p: Point, tolerance: f64) -> Option<&Load> {
        let candidates = self.loads.iter().rev().map(|l| (l, load_distance(l, p)));
        nearest(candidates, tolerance)
    }

    pub fn find_support_at(&self, p: Point, tolerance: f64) -> Option<&Support> {
        let candidates = self.supports.iter().map(|s| (s, s.position.distance(p)));
        nearest(candidates, tolerance)
    }

    /// First element under the point, checking supports, loads, members and
    /// then surfaces. Surfaces come last since they cover large areas.
    pub fn find_element_at(&self, p: Point, tolerance: f64) -> Option<ElementRef> {
        if let Some(s) = self.find_support_at(p, tolerance) {
            return Some(ElementRef::Support(s.id.clone()));
        }
        if let Some(l) = self.find_load_at(p, tolerance) {
            return Some(ElementRef::Load(l.id.clone()));
        }
        if let Some(m) = self.find_member_at(p, tolerance) {
            return Some(ElementRef::Member(m.id.clone()));
        }
        self.find_surface_at(p, tolerance).map(|s| ElementRef::Surface(s.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemberOptions, SupportOptions, SurfaceOptions};
    use crate::elements::PointForces;
    use kurbo::Rect;

    #[test]
    fn test_find_node_nearest_and_strict() {
        let mut doc = Document::new();
        let a = doc.add_node(Point::new(0.0, 0.0)).unwrap();
        let b = doc.add_node(Point::new(100.0, 0.0)).unwrap();
        assert_eq!(doc.find_node_at(Point::new(70.0, 0.0), 50.0).unwrap().id, b);
        assert_eq!(doc.find_node_at(Point::new(20.0, 0.0), 50.0).unwrap().id, a);
        assert!(doc.find_node_at(Point::new(50.0, 0.0), 50.0).is_none());
        assert_eq!(
            doc.find_node_at_excluding(Point::new(70.0, 0.0), 80.0, Some(&b)).unwrap().id,
            a
        );
    }

    #[test]
    fn test_find_member_by_segment_distance() {
        let mut doc = Document::new();
        let a = doc.find_or_create_node(Point::new(0.0, 0.0), 0.01).unwrap();
        let b = doc.find_or_create_node(Point::new(5000.0, 0.0), 0.01).unwrap();
        let id = doc.add_member(&a, &b, MemberOptions::default()).unwrap();
        assert_eq!(doc.find_member_at(Point::new(2500.0, 100.0), 160.0).unwrap().id, id);
        assert!(doc.find_member_at(Point::new(2500.0, 200.0), 160.0).is_none());
        assert!(doc.find_member_at(Point::new(5200.0, 0.0), 160.0).is_none());
    }

    #[test]
    fn test_floor_rect_inclusive() {
        let mut doc = Document::new();
        let geometry = SurfaceGeometry::rect(Point::new(0.0, 0.0), Point::new(5000.0, 4000.0));
        let id = doc.add_surface(geometry, SurfaceOptions::default()).unwrap();
        assert_eq!(doc.find_surface_at(Point::new(5000.0, 4000.0), 1.0).unwrap().id, id);
        assert!(doc.find_surface_at(Point::new(5001.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_wall_line_uses_display_offset() {
        let mut doc = Document::new();
        let geometry = SurfaceGeometry::Line {
            start: Point::new(0.0, 0.0),
            end: Point::new(4000.0, 0.0),
        };
        let id = doc.add_surface(geometry, SurfaceOptions::default()).unwrap();
        assert_eq!(doc.find_surface_at(Point::new(2000.0, 120.0), 10.0).unwrap().id, id);
        assert!(doc.find_surface_at(Point::new(2000.0, -100.0), 10.0).is_none());
    }

    #[test]
    fn test_exterior_wall_hits_offset_outline_only() {
        let mut doc = Document::new();
        let square = SurfaceGeometry::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(4000.0, 0.0),
            Point::new(4000.0, 4000.0),
            Point::new(0.0, 4000.0),
        ]);
        let options = SurfaceOptions {
            kind: Some(SurfaceKind::ExteriorWall),
            ..SurfaceOptions::default()
        };
        let id = doc.add_surface(square, options).unwrap();
        assert_eq!(doc.find_surface_at(Point::new(2000.0, -120.0), 50.0).unwrap().id, id);
        assert_eq!(doc.find_surface_at(Point::new(4120.0, 2000.0), 50.0).unwrap().id, id);
        assert!(doc.find_surface_at(Point::new(2000.0, 2000.0), 50.0).is_none());
    }

    #[test]
    fn test_latest_surface_wins() {
        let mut doc = Document::new();
        let rect = || SurfaceGeometry::rect(Point::new(0.0, 0.0), Point::new(1000.0, 1000.0));
        doc.add_surface(rect(), SurfaceOptions::default()).unwrap();
        let top = doc.add_surface(rect(), SurfaceOptions::default()).unwrap();
        assert_eq!(doc.find_surface_at(Point::new(500.0, 500.0), 1.0).unwrap().id, top);
    }

    #[test]
    fn test_find_loads() {
        let mut doc = Document::new();
        let area = doc
            .add_load(
                LoadKind::Area {
                    rect: Rect::new(0.0, 0.0, 3000.0, 3000.0),
                    value: 1.0,
                },
                None,
            )
            .unwrap();
        let point = doc
            .add_load(
                LoadKind::Point {
                    at: Point::new(5000.0, 5000.0),
                    forces: PointForces::default(),
                },
                None,
            )
            .unwrap();
        assert_eq!(doc.find_load_at(Point::new(1500.0, 1500.0), 100.0).unwrap().id, area);
        assert_eq!(doc.find_load_at(Point::new(5050.0, 5000.0), 100.0).unwrap().id, point);
        assert!(doc.find_load_at(Point::new(4000.0, 4000.0), 100.0).is_none());
    }

    #[test]
    fn test_find_element_prefers_small_targets() {
        let mut doc = Document::new();
        let geometry = SurfaceGeometry::rect(Point::new(0.0, 0.0), Point::new(5000.0, 5000.0));
        let surface = doc.add_surface(geometry, SurfaceOptions::default()).unwrap();
        let support = doc.add_support(Point::new(1000.0, 1000.0), SupportOptions::default()).unwrap();
        assert_eq!(
            doc.find_element_at(Point::new(1010.0, 1000.0), 100.0),
            Some(ElementRef::Support(support))
        );
        assert_eq!(
            doc.find_element_at(Point::new(3000.0, 3000.0), 100.0),
            Some(ElementRef::Surface(surface))
        );
        assert!(doc.find_element_at(Point::new(9000.0, 9000.0), 100.0).is_none());
    }
}
