//! Planar geometry helpers shared by hit-testing and the renderers.
//!
//! All functions are pure and work in world coordinates (millimeters).

use kurbo::{Point, Rect, Vec2};

/// Edges shorter than this contribute no outward normal.
const DEGENERATE_EDGE: f64 = 0.001;

/// Cross products below this are treated as parallel edges.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Substituted for a zero edge height in the ray-casting test.
const HORIZONTAL_EDGE_EPSILON: f64 = 1e-9;

/// Euclidean distance from `p` to the closest point on segment `ab`.
///
/// The projection parameter is clamped to `[0, 1]`; a degenerate segment
/// (`a == b`) yields the point-to-point distance.
pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Even-odd ray-casting containment test.
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = vertices[i];
        let vj = vertices[j];
        if (vi.y > p.y) != (vj.y > p.y) {
            let mut height = vj.y - vi.y;
            if height == 0.0 {
                height = HORIZONTAL_EDGE_EPSILON;
            }
            let x_cross = (vj.x - vi.x) * (p.y - vi.y) / height + vi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Twice the signed area of a closed polygon. Positive for counter-clockwise
/// winding in a Y-up frame.
pub fn signed_area2(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let p1 = vertices[i];
            let p2 = vertices[(i + 1) % n];
            p1.x * p2.y - p2.x * p1.y
        })
        .sum()
}

/// Unit outward normals for each edge `i -> i+1` of a closed polygon.
fn outward_normals(vertices: &[Point]) -> Vec<Vec2> {
    let n = vertices.len();
    let ccw = signed_area2(vertices) >= 0.0;
    (0..n)
        .map(|i| {
            let d = vertices[(i + 1) % n] - vertices[i];
            let len = d.hypot();
            if len < DEGENERATE_EDGE {
                Vec2::ZERO
            } else if ccw {
                Vec2::new(d.y / len, -d.x / len)
            } else {
                Vec2::new(-d.y / len, d.x / len)
            }
        })
        .collect()
}

/// Shift every edge of a closed polygon outward by `offset`, re-mitering
/// corners at the intersection of adjacent offset edge lines.
///
/// The outward side is derived once from the winding sign, so the result is
/// the same for either vertex order and holds for concave corners. When two
/// adjacent edges are (nearly) collinear the corner falls back to the start
/// of the offset outgoing edge.
pub fn offset_polygon_outward(vertices: &[Point], offset: f64) -> Vec<Point> {
    let n = vertices.len();
    if n < 2 {
        return vertices.to_vec();
    }
    let normals = outward_normals(vertices);

    (0..n)
        .map(|i| {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            let pa = vertices[prev] + normals[prev] * offset;
            let da = vertices[i] - vertices[prev];
            let pb = vertices[i] + normals[i] * offset;
            let db = vertices[next] - vertices[i];

            let cross = da.cross(db);
            if cross.abs() < PARALLEL_EPSILON {
                pb
            } else {
                let t = (pb - pa).cross(db) / cross;
                pa + da * t
            }
        })
        .collect()
}

/// Minimum distance from `p` to any edge of a closed polygon.
pub fn distance_to_polygon_edges(p: Point, vertices: &[Point]) -> f64 {
    let n = vertices.len();
    match n {
        0 => f64::INFINITY,
        1 => p.distance(vertices[0]),
        _ => (0..n)
            .map(|i| distance_point_to_segment(p, vertices[i], vertices[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Axis-aligned bounds of a point set.
pub fn bounds_of(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut rect = Rect::from_points(*first, *first);
    for p in &points[1..] {
        rect = rect.union_pt(*p);
    }
    Some(rect)
}

/// Normalized rectangle spanned by two corners.
pub fn rect_from_corners(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Inclusive containment test (kurbo's `Rect::contains` excludes the far edges).
pub fn rect_contains_inclusive(rect: Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}
