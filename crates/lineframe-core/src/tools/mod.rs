//! Placement tools.
//!
//! A [`ToolManager`] collects clicked points for the current tool and turns
//! them into a finished [`Placement`] once the shape is complete. It never
//! touches the document; the session commits placements.

use crate::elements::{LoadType, SurfaceGeometry, SurfaceShape};
use crate::geometry::rect_from_corners;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Two clicks closer than this (world units) are the same point.
pub const MIN_SEGMENT_LENGTH: f64 = 0.01;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    PlaceMember,
    PlaceSurface(SurfaceShape),
    PlaceLoad(LoadType),
    PlaceSupport,
}

impl ToolKind {
    pub fn is_placement(self) -> bool {
        self != ToolKind::Select
    }

    /// Clicks needed to finish a shape, `None` for open-ended polygons.
    fn clicks_to_complete(self) -> Option<usize> {
        match self {
            ToolKind::Select => Some(0),
            ToolKind::PlaceSurface(SurfaceShape::Polygon) => None,
            ToolKind::PlaceLoad(LoadType::PointLoad) | ToolKind::PlaceSupport => Some(1),
            ToolKind::PlaceMember | ToolKind::PlaceSurface(_) | ToolKind::PlaceLoad(_) => Some(2),
        }
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    #[default]
    Idle,
    /// Points staged so far plus the latest cursor position.
    Placing { points: Vec<Point>, current: Point },
}

/// Live geometry of an in-progress placement, for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Segment { start: Point, end: Point },
    Rect(Rect),
    /// Staged polygon vertices followed by the cursor.
    Polyline(Vec<Point>),
}

/// A completed shape, ready to be added to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Member { start: Point, end: Point },
    Surface(SurfaceGeometry),
    AreaLoad(Rect),
    LineLoad { start: Point, end: Point },
    PointLoad(Point),
    Support(Point),
}

/// Manages the current tool and its state.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    current_tool: ToolKind,
    state: ToolState,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tool(&self) -> ToolKind {
        self.current_tool
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    /// Switch tools, discarding any staged points. Selecting the current
    /// tool again changes nothing. Returns whether the tool changed.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        if tool == self.current_tool {
            return false;
        }
        log::debug!("Tool {:?} -> {:?}", self.current_tool, tool);
        self.current_tool = tool;
        self.state = ToolState::Idle;
        true
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Placing { .. })
    }

    /// Staged points of the current placement.
    pub fn points(&self) -> &[Point] {
        match &self.state {
            ToolState::Placing { points, .. } => points,
            ToolState::Idle => &[],
        }
    }

    /// Last staged point, the origin for the angle constraint.
    pub fn anchor(&self) -> Option<Point> {
        self.points().last().copied()
    }

    /// Stage a click. Returns the finished shape when this click completes
    /// it. A polygon is closed by clicking within `close_tolerance` of its
    /// first vertex once it has three.
    pub fn click(&mut self, point: Point, close_tolerance: f64) -> Option<Placement> {
        let tool = self.current_tool;
        if !tool.is_placement() {
            return None;
        }
        let mut points = match std::mem::take(&mut self.state) {
            ToolState::Placing { points, .. } => points,
            ToolState::Idle => Vec::new(),
        };

        if let Some(last) = points.last() {
            if last.distance(point) < MIN_SEGMENT_LENGTH {
                self.state = ToolState::Placing { points, current: point };
                return None;
            }
        }

        if tool.clicks_to_complete().is_none() {
            let closes = points.len() >= 3 && points.first().is_some_and(|first| first.distance(point) < close_tolerance);
            if closes {
                return Some(Placement::Surface(SurfaceGeometry::Polygon(points)));
            }
        }

        points.push(point);
        match tool.clicks_to_complete() {
            Some(needed) if points.len() >= needed => build(tool, &points),
            _ => {
                self.state = ToolState::Placing { points, current: point };
                None
            }
        }
    }

    /// Track the cursor for the preview.
    pub fn update(&mut self, point: Point) {
        if let ToolState::Placing { current, .. } = &mut self.state {
            *current = point;
        }
    }

    /// Finish an open-ended polygon. Needs at least three staged vertices;
    /// otherwise nothing changes.
    pub fn confirm(&mut self) -> Option<Placement> {
        if self.current_tool.clicks_to_complete().is_some() || self.points().len() < 3 {
            return None;
        }
        match std::mem::take(&mut self.state) {
            ToolState::Placing { points, .. } => Some(Placement::Surface(SurfaceGeometry::Polygon(points))),
            ToolState::Idle => None,
        }
    }

    /// Drop the in-progress placement. Returns whether anything was staged.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = ToolState::Idle;
        was_active
    }

    pub fn preview(&self) -> Option<Preview> {
        let ToolState::Placing { points, current } = &self.state else {
            return None;
        };
        let first = *points.first()?;
        let preview = match self.current_tool {
            ToolKind::PlaceSurface(SurfaceShape::Rect) | ToolKind::PlaceLoad(LoadType::AreaLoad) => {
                Preview::Rect(rect_from_corners(first, *current))
            }
            ToolKind::PlaceSurface(SurfaceShape::Polygon) => {
                let mut outline = points.clone();
                outline.push(*current);
                Preview::Polyline(outline)
            }
            _ => Preview::Segment {
                start: first,
                end: *current,
            },
        };
        Some(preview)
    }
}

fn build(tool: ToolKind, points: &[Point]) -> Option<Placement> {
    let first = *points.first()?;
    let last = *points.last()?;
    let placement = match tool {
        ToolKind::Select => return None,
        ToolKind::PlaceMember => Placement::Member { start: first, end: last },
        ToolKind::PlaceSurface(SurfaceShape::Rect) => Placement::Surface(SurfaceGeometry::rect(first, last)),
        ToolKind::PlaceSurface(SurfaceShape::Line) => Placement::Surface(SurfaceGeometry::Line { start: first, end: last }),
        ToolKind::PlaceSurface(SurfaceShape::Polygon) => Placement::Surface(SurfaceGeometry::Polygon(points.to_vec())),
        ToolKind::PlaceLoad(LoadType::AreaLoad) => Placement::AreaLoad(rect_from_corners(first, last)),
        ToolKind::PlaceLoad(LoadType::LineLoad) => Placement::LineLoad { start: first, end: last },
        ToolKind::PlaceLoad(LoadType::PointLoad) => Placement::PointLoad(first),
        ToolKind::PlaceSupport => Placement::Support(first),
    };
    Some(placement)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSE: f64 = 200.0;

    #[test]
    fn test_tool_selection() {
        let mut tm = ToolManager::new();
        assert_eq!(tm.current_tool(), ToolKind::Select);
        assert!(tm.set_tool(ToolKind::PlaceMember));
        assert!(!tm.set_tool(ToolKind::PlaceMember));
        assert_eq!(tm.current_tool(), ToolKind::PlaceMember);
    }

    #[test]
    fn test_member_two_clicks() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceMember);
        assert!(tm.click(Point::new(0.0, 0.0), CLOSE).is_none());
        assert!(tm.is_active());
        assert_eq!(tm.anchor(), Some(Point::new(0.0, 0.0)));

        tm.update(Point::new(2500.0, 0.0));
        assert_eq!(
            tm.preview(),
            Some(Preview::Segment {
                start: Point::new(0.0, 0.0),
                end: Point::new(2500.0, 0.0)
            })
        );

        let placement = tm.click(Point::new(5000.0, 0.0), CLOSE);
        assert_eq!(
            placement,
            Some(Placement::Member {
                start: Point::new(0.0, 0.0),
                end: Point::new(5000.0, 0.0)
            })
        );
        assert!(!tm.is_active());
        assert!(tm.preview().is_none());
    }

    #[test]
    fn test_zero_length_click_ignored() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceMember);
        tm.click(Point::new(1000.0, 1000.0), CLOSE);
        assert!(tm.click(Point::new(1000.0, 1000.005), CLOSE).is_none());
        assert!(tm.is_active());
        assert_eq!(tm.points().len(), 1);
    }

    #[test]
    fn test_single_click_tools() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceSupport);
        assert_eq!(tm.click(Point::new(10.0, 20.0), CLOSE), Some(Placement::Support(Point::new(10.0, 20.0))));
        assert!(!tm.is_active());

        tm.set_tool(ToolKind::PlaceLoad(LoadType::PointLoad));
        assert_eq!(tm.click(Point::new(1.0, 2.0), CLOSE), Some(Placement::PointLoad(Point::new(1.0, 2.0))));
    }

    #[test]
    fn test_rect_preview_and_placement() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceLoad(LoadType::AreaLoad));
        tm.click(Point::new(3000.0, 3000.0), CLOSE);
        tm.update(Point::new(0.0, 1000.0));
        assert_eq!(tm.preview(), Some(Preview::Rect(Rect::new(0.0, 1000.0, 3000.0, 3000.0))));
        let placement = tm.click(Point::new(0.0, 0.0), CLOSE);
        assert_eq!(placement, Some(Placement::AreaLoad(Rect::new(0.0, 0.0, 3000.0, 3000.0))));
    }

    #[test]
    fn test_polygon_closes_on_first_vertex() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceSurface(SurfaceShape::Polygon));
        for p in [Point::new(0.0, 0.0), Point::new(4000.0, 0.0), Point::new(4000.0, 3000.0)] {
            assert!(tm.click(p, CLOSE).is_none());
        }
        tm.update(Point::new(100.0, 2000.0));
        match tm.preview() {
            Some(Preview::Polyline(points)) => assert_eq!(points.len(), 4),
            other => panic!("unexpected preview {other:?}"),
        }
        match tm.click(Point::new(50.0, 50.0), CLOSE) {
            Some(Placement::Surface(SurfaceGeometry::Polygon(points))) => assert_eq!(points.len(), 3),
            other => panic!("unexpected placement {other:?}"),
        }
        assert!(!tm.is_active());
    }

    #[test]
    fn test_polygon_confirm_needs_three_points() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceSurface(SurfaceShape::Polygon));
        tm.click(Point::new(0.0, 0.0), CLOSE);
        tm.click(Point::new(4000.0, 0.0), CLOSE);
        assert!(tm.confirm().is_none());
        assert!(tm.is_active());
        tm.click(Point::new(0.0, 3000.0), CLOSE);
        assert!(matches!(tm.confirm(), Some(Placement::Surface(SurfaceGeometry::Polygon(_)))));
        assert!(!tm.is_active());
    }

    #[test]
    fn test_switching_tool_discards_draft() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceMember);
        tm.click(Point::new(0.0, 0.0), CLOSE);
        tm.set_tool(ToolKind::Select);
        assert!(!tm.is_active());
        assert!(tm.preview().is_none());
    }

    #[test]
    fn test_cancel() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::PlaceSurface(SurfaceShape::Line));
        assert!(!tm.cancel());
        tm.click(Point::new(0.0, 0.0), CLOSE);
        assert!(tm.cancel());
        assert!(!tm.is_active());
    }

    #[test]
    fn test_select_tool_places_nothing() {
        let mut tm = ToolManager::new();
        assert!(tm.click(Point::new(0.0, 0.0), CLOSE).is_none());
        assert!(!tm.is_active());
    }
}
