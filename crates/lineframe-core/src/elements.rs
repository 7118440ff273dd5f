//! Entity records owned by the document model.
//!
//! Elements reference nodes, levels and catalog entries by id or name only,
//! so the whole model is acyclic and clones structurally.

use crate::color::Color;
use crate::geometry::{bounds_of, rect_from_corners};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type NodeId = String;
pub type MemberId = String;
pub type SurfaceId = String;
pub type LoadId = String;
pub type SupportId = String;
pub type LevelId = String;

/// Legacy member type names accepted wherever a member type is parsed.
pub const MEMBER_TYPE_ALIASES: &[(&str, &str)] = &[("brace", "hbrace")];

/// A plan-view point shared by line elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
}

/// A named horizontal elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub name: String,
    pub z: f64,
}

/// Line element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum MemberKind {
    #[default]
    Beam,
    Column,
    HBrace,
    VBrace,
}

impl MemberKind {
    pub const ALL: [MemberKind; 4] = [
        MemberKind::Beam,
        MemberKind::Column,
        MemberKind::HBrace,
        MemberKind::VBrace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Beam => "beam",
            MemberKind::Column => "column",
            MemberKind::HBrace => "hbrace",
            MemberKind::VBrace => "vbrace",
        }
    }

    /// Columns and vertical braces span from a base level to a top level.
    pub fn is_vertical(self) -> bool {
        matches!(self, MemberKind::Column | MemberKind::VBrace)
    }
}

impl FromStr for MemberKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = MEMBER_TYPE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(name);
        MemberKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| format!("unknown member type: {s:?}"))
    }
}

impl TryFrom<String> for MemberKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemberKind> for String {
    fn from(kind: MemberKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planar element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceKind {
    #[default]
    Floor,
    Wall,
    ExteriorWall,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 3] = [SurfaceKind::Floor, SurfaceKind::Wall, SurfaceKind::ExteriorWall];

    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceKind::Floor => "floor",
            SurfaceKind::Wall => "wall",
            SurfaceKind::ExteriorWall => "exteriorWall",
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, SurfaceKind::Wall | SurfaceKind::ExteriorWall)
    }

    /// Color used when neither the element nor its section supplies one.
    pub fn default_color(self) -> Color {
        if self == SurfaceKind::Floor {
            Color::FLOOR
        } else {
            Color::WALL
        }
    }
}

impl FromStr for SurfaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        SurfaceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| format!("unknown surface type: {s:?}"))
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cross-section dimensions in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionSize {
    pub b: f64,
    pub h: f64,
}

impl SectionSize {
    pub const DEFAULT_B: f64 = 200.0;
    pub const DEFAULT_H: f64 = 400.0;

    pub const fn new(b: f64, h: f64) -> Self {
        Self { b, h }
    }
}

impl Default for SectionSize {
    fn default() -> Self {
        Self::new(Self::DEFAULT_B, Self::DEFAULT_H)
    }
}

/// Return `value` if it is a finite positive number, otherwise `fallback`.
pub fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => fallback,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndCondition {
    Pin,
    #[default]
    Rigid,
    Spring,
}

impl EndCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            EndCondition::Pin => "pin",
            EndCondition::Rigid => "rigid",
            EndCondition::Spring => "spring",
        }
    }
}

impl FromStr for EndCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pin" => Ok(EndCondition::Pin),
            "rigid" => Ok(EndCondition::Rigid),
            "spring" => Ok(EndCondition::Spring),
            other => Err(format!("unknown end condition: {other:?}")),
        }
    }
}

/// End-fixity of a member end. `spring_symbol` is only set for springs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EndFixity {
    pub condition: EndCondition,
    pub spring_symbol: Option<String>,
}

impl EndFixity {
    pub fn pin() -> Self {
        Self { condition: EndCondition::Pin, spring_symbol: None }
    }

    pub fn rigid() -> Self {
        Self::default()
    }

    pub fn spring(symbol: impl Into<String>) -> Self {
        Self {
            condition: EndCondition::Spring,
            spring_symbol: Some(symbol.into()),
        }
    }

    pub fn uses_spring(&self, symbol: &str) -> bool {
        self.condition == EndCondition::Spring && self.spring_symbol.as_deref() == Some(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BracePattern {
    #[default]
    Single,
    Cross,
}

/// A line element. `section`, `material` and `color` are resolved from the
/// catalog entry named by `section_name` and are never edited directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub id: MemberId,
    pub kind: MemberKind,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub section_name: String,
    pub section: SectionSize,
    pub material: String,
    pub color: Color,
    pub level_id: LevelId,
    pub top_level_id: Option<LevelId>,
    pub brace_pattern: BracePattern,
    pub end_i: EndFixity,
    pub end_j: EndFixity,
}

impl Member {
    pub fn references_node(&self, id: &str) -> bool {
        self.start_node == id || self.end_node == id
    }

    pub fn references_level(&self, id: &str) -> bool {
        self.level_id == id || self.top_level_id.as_deref() == Some(id)
    }

    pub fn uses_spring(&self, symbol: &str) -> bool {
        self.end_i.uses_spring(symbol) || self.end_j.uses_spring(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LoadDirection {
    X,
    Y,
    #[default]
    TwoWay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceShape {
    #[default]
    Rect,
    Line,
    Polygon,
}

/// Planar element geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceGeometry {
    /// Axis-aligned rectangle between two corners (normalized).
    Rect(Rect),
    /// A wall drawn as a single segment.
    Line { start: Point, end: Point },
    /// Ordered vertices, at least three, without a repeated closing point.
    Polygon(Vec<Point>),
}

impl SurfaceGeometry {
    pub fn rect(a: Point, b: Point) -> Self {
        SurfaceGeometry::Rect(rect_from_corners(a, b))
    }

    pub fn shape(&self) -> SurfaceShape {
        match self {
            SurfaceGeometry::Rect(_) => SurfaceShape::Rect,
            SurfaceGeometry::Line { .. } => SurfaceShape::Line,
            SurfaceGeometry::Polygon(_) => SurfaceShape::Polygon,
        }
    }

    /// Bounding box used for rect/line compatibility and coarse hit-testing.
    pub fn bounds(&self) -> Rect {
        match self {
            SurfaceGeometry::Rect(rect) => *rect,
            SurfaceGeometry::Line { start, end } => rect_from_corners(*start, *end),
            SurfaceGeometry::Polygon(points) => bounds_of(points).unwrap_or(Rect::ZERO),
        }
    }

    /// Vertex list: two points for a line, the polygon itself, or `None` for a rect.
    pub fn points(&self) -> Option<Vec<Point>> {
        match self {
            SurfaceGeometry::Rect(_) => None,
            SurfaceGeometry::Line { start, end } => Some(vec![*start, *end]),
            SurfaceGeometry::Polygon(points) => Some(points.clone()),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            SurfaceGeometry::Rect(rect) => *rect = *rect + delta,
            SurfaceGeometry::Line { start, end } => {
                *start += delta;
                *end += delta;
            }
            SurfaceGeometry::Polygon(points) => {
                for p in points {
                    *p += delta;
                }
            }
        }
    }

    /// First defining point, used as the drag reference.
    pub fn anchor(&self) -> Point {
        match self {
            SurfaceGeometry::Rect(rect) => rect.origin(),
            SurfaceGeometry::Line { start, .. } => *start,
            SurfaceGeometry::Polygon(points) => points.first().copied().unwrap_or(Point::ZERO),
        }
    }
}

/// A planar element whose `color` is resolved from its section.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub id: SurfaceId,
    pub kind: SurfaceKind,
    pub section_name: String,
    pub color: Color,
    pub level_id: LevelId,
    pub top_level_id: LevelId,
    pub load_direction: LoadDirection,
    pub geometry: SurfaceGeometry,
}

impl Surface {
    pub fn shape(&self) -> SurfaceShape {
        self.geometry.shape()
    }

    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    pub fn references_level(&self, id: &str) -> bool {
        self.level_id == id || self.top_level_id == id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LoadType {
    #[default]
    AreaLoad,
    LineLoad,
    PointLoad,
}

impl LoadType {
    pub fn default_color(self) -> Color {
        match self {
            LoadType::AreaLoad => Color::AREA_LOAD,
            LoadType::LineLoad => Color::LINE_LOAD,
            LoadType::PointLoad => Color::POINT_LOAD,
        }
    }
}

/// Concentrated forces and moments of a point load.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointForces {
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadKind {
    Area { rect: Rect, value: f64 },
    Line { start: Point, end: Point, value: f64 },
    Point { at: Point, forces: PointForces },
}

impl LoadKind {
    pub fn load_type(&self) -> LoadType {
        match self {
            LoadKind::Area { .. } => LoadType::AreaLoad,
            LoadKind::Line { .. } => LoadType::LineLoad,
            LoadKind::Point { .. } => LoadType::PointLoad,
        }
    }

    pub fn anchor(&self) -> Point {
        match self {
            LoadKind::Area { rect, .. } => rect.origin(),
            LoadKind::Line { start, .. } => *start,
            LoadKind::Point { at, .. } => *at,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            LoadKind::Area { rect, .. } => *rect = *rect + delta,
            LoadKind::Line { start, end, .. } => {
                *start += delta;
                *end += delta;
            }
            LoadKind::Point { at, .. } => *at += delta,
        }
    }
}

/// A load annotation. No structural analysis is performed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub id: LoadId,
    pub level_id: LevelId,
    pub color: Color,
    pub kind: LoadKind,
}

impl Load {
    pub fn load_type(&self) -> LoadType {
        self.kind.load_type()
    }
}

/// Six independent restraint flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restraints {
    pub dx: bool,
    pub dy: bool,
    pub dz: bool,
    pub rx: bool,
    pub ry: bool,
    pub rz: bool,
}

impl Restraints {
    pub const PINNED: Restraints = Restraints {
        dx: true,
        dy: true,
        dz: true,
        rx: false,
        ry: false,
        rz: false,
    };

    pub const FIXED: Restraints = Restraints {
        dx: true,
        dy: true,
        dz: true,
        rx: true,
        ry: true,
        rz: true,
    };
}

impl Default for Restraints {
    fn default() -> Self {
        Restraints::PINNED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Support {
    pub id: SupportId,
    pub position: Point,
    pub level_id: LevelId,
    pub restraints: Restraints,
}

/// Reference to one selectable element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Member(MemberId),
    Surface(SurfaceId),
    Load(LoadId),
    Support(SupportId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_kind_alias() {
        assert_eq!("brace".parse::<MemberKind>(), Ok(MemberKind::HBrace));
        assert_eq!("hbrace".parse::<MemberKind>(), Ok(MemberKind::HBrace));
        assert_eq!("vbrace".parse::<MemberKind>(), Ok(MemberKind::VBrace));
        assert!("truss".parse::<MemberKind>().is_err());
    }

    #[test]
    fn test_member_kind_serde() {
        let kind: MemberKind = serde_json::from_str("\"brace\"").unwrap();
        assert_eq!(kind, MemberKind::HBrace);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"hbrace\"");
    }

    #[test]
    fn test_surface_kind_names() {
        assert_eq!(serde_json::to_string(&SurfaceKind::ExteriorWall).unwrap(), "\"exteriorWall\"");
        assert_eq!("exteriorWall".parse::<SurfaceKind>(), Ok(SurfaceKind::ExteriorWall));
        assert_eq!(SurfaceKind::Floor.default_color(), Color::FLOOR);
        assert_eq!(SurfaceKind::ExteriorWall.default_color(), Color::WALL);
    }

    #[test]
    fn test_load_direction_names() {
        assert_eq!(serde_json::to_string(&LoadDirection::TwoWay).unwrap(), "\"twoWay\"");
        assert_eq!(serde_json::to_string(&LoadDirection::X).unwrap(), "\"x\"");
    }

    #[test]
    fn test_positive_or() {
        assert_eq!(positive_or(Some(300.0), 200.0), 300.0);
        assert_eq!(positive_or(Some(0.0), 200.0), 200.0);
        assert_eq!(positive_or(Some(-5.0), 200.0), 200.0);
        assert_eq!(positive_or(Some(f64::NAN), 200.0), 200.0);
        assert_eq!(positive_or(None, 400.0), 400.0);
    }

    #[test]
    fn test_geometry_bounds_and_translate() {
        let mut geom = SurfaceGeometry::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(4000.0, 0.0),
            Point::new(4000.0, 3000.0),
        ]);
        assert_eq!(geom.bounds(), Rect::new(0.0, 0.0, 4000.0, 3000.0));
        geom.translate(Vec2::new(100.0, -100.0));
        assert_eq!(geom.bounds(), Rect::new(100.0, -100.0, 4100.0, 2900.0));
        assert_eq!(geom.anchor(), Point::new(100.0, -100.0));
    }

    #[test]
    fn test_rect_geometry_normalizes_corners() {
        let geom = SurfaceGeometry::rect(Point::new(500.0, 400.0), Point::new(0.0, 0.0));
        assert_eq!(geom.bounds(), Rect::new(0.0, 0.0, 500.0, 400.0));
        assert!(geom.points().is_none());
    }

    #[test]
    fn test_end_fixity_spring_usage() {
        let end = EndFixity::spring("SP1");
        assert!(end.uses_spring("SP1"));
        assert!(!EndFixity::pin().uses_spring("SP1"));
    }
}
