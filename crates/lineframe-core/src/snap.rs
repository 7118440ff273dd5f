//! Snap functionality for placing and dragging points.
//!
//! Priority, highest first: angle constraint from a placement anchor, an
//! existing node near the cursor, the document grid.

use crate::camera::Camera;
use crate::document::Document;
use crate::elements::NodeId;
use kurbo::Point;

/// Angle constraint increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 45.0;

/// What a point was snapped to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SnapTarget {
    /// Raw cursor position.
    #[default]
    None,
    Grid,
    Node(NodeId),
    /// Constrained to an angle increment from an anchor.
    Angle,
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub point: Point,
    pub target: SnapTarget,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            target: SnapTarget::None,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.target != SnapTarget::None
    }

    /// Node the point landed on, if any.
    pub fn node(&self) -> Option<&str> {
        match &self.target {
            SnapTarget::Node(id) => Some(id),
            _ => None,
        }
    }
}

/// Inputs for [`snap_position`] beyond the raw point.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapOptions<'a> {
    /// First point of an in-progress placement.
    pub anchor: Option<Point>,
    /// Shift held: constrain to angle increments from `anchor`.
    pub constrain_angle: bool,
    /// Node being dragged, never snapped onto.
    pub exclude_node: Option<&'a str>,
    /// Node snap radius in screen pixels.
    pub node_radius_px: f64,
    /// Angle increment in degrees.
    pub angle_step: f64,
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    let snapped = (angle_degrees / increment).round() * increment;
    // Normalize to 0-360
    if snapped < 0.0 {
        snapped + 360.0
    } else if snapped >= 360.0 {
        snapped - 360.0
    } else {
        snapped
    }
}

/// Rotate `point` about `origin` onto the nearest angle increment, keeping
/// its distance. A point on the origin is returned unchanged.
pub fn constrain_angle(origin: Point, point: Point, increment: f64) -> Point {
    let delta = point - origin;
    let distance = delta.hypot();
    if distance == 0.0 {
        return origin;
    }
    let angle = delta.y.atan2(delta.x).to_degrees();
    let angle = if angle < 0.0 { angle + 360.0 } else { angle };
    let snapped = snap_angle(angle, increment).to_radians();
    Point::new(origin.x + distance * snapped.cos(), origin.y + distance * snapped.sin())
}

/// Snap a point to the nearest grid intersection. Each axis rounds
/// independently.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    SnapResult {
        point: Point::new(
            (point.x / grid_size).round() * grid_size,
            (point.y / grid_size).round() * grid_size,
        ),
        target: SnapTarget::Grid,
    }
}

/// Snap onto the nearest node within `tolerance` world units.
pub fn snap_to_node(document: &Document, point: Point, tolerance: f64, exclude: Option<&str>) -> Option<SnapResult> {
    let node = document.find_node_at_excluding(point, tolerance, exclude)?;
    Some(SnapResult {
        point: node.position,
        target: SnapTarget::Node(node.id.clone()),
    })
}

/// Resolve a raw world position. With snapping switched off in the document
/// settings only the angle constraint applies.
pub fn snap_position(document: &Document, camera: &Camera, raw: Point, options: SnapOptions<'_>) -> SnapResult {
    if options.constrain_angle {
        if let Some(anchor) = options.anchor {
            return SnapResult {
                point: constrain_angle(anchor, raw, options.angle_step),
                target: SnapTarget::Angle,
            };
        }
    }
    if !document.settings.snap {
        return SnapResult::none(raw);
    }
    let tolerance = camera.world_distance(options.node_radius_px);
    snap_to_node(document, raw, tolerance, options.exclude_node)
        .unwrap_or_else(|| snap_to_grid(raw, document.settings.effective_grid_size()))
}
