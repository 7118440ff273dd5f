//! The document model.
//!
//! A [`Document`] owns levels, nodes, every element kind and the catalog the
//! elements resolve against. All mutation goes through its methods so the
//! invariants hold after every call: ids are never reused, every element's
//! section name resolves, and no node is left without a member.

mod hit_test;
mod levels;
mod members;
mod surfaces;

pub use levels::{LevelPatch, LevelUsage};
pub use members::{MemberOptions, MemberPatch};
pub use surfaces::{LoadPatch, SupportOptions, SupportPatch, SurfaceOptions, SurfacePatch};
pub(crate) use members::apply_member_section;
pub(crate) use surfaces::apply_surface_section;

use crate::catalog::{Catalog, NewSection, SectionDefinition, SectionKind, SectionPatch, SpringDefinition};
use crate::config::Settings;
use crate::elements::{ElementRef, Level, LevelId, Load, Member, Node, Support, Surface};
use crate::error::ValidationError;
use kurbo::Point;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const NODE_PREFIX: &str = "N";
pub const MEMBER_PREFIX: &str = "M";
pub const SURFACE_PREFIX: &str = "S";
pub const LEVEL_PREFIX: &str = "L";
pub const LOAD_PREFIX: &str = "LD";
pub const SUPPORT_PREFIX: &str = "SUP";

/// Descriptive header stored with the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Meta {
    pub name: String,
    /// Length unit of all coordinates.
    pub unit: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            unit: "mm".to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Highest numeric suffix handed out per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IdCounters {
    pub node: u64,
    pub member: u64,
    pub surface: u64,
    pub level: u64,
    pub load: u64,
    pub support: u64,
}

impl IdCounters {
    /// Counters that never go below either input.
    fn max(self, other: IdCounters) -> IdCounters {
        IdCounters {
            node: self.node.max(other.node),
            member: self.member.max(other.member),
            surface: self.surface.max(other.surface),
            level: self.level.max(other.level),
            load: self.load.max(other.load),
            support: self.support.max(other.support),
        }
    }
}

/// Reject NaN and infinities, which cannot be written to a document file.
pub(crate) fn ensure_finite(values: &[f64]) -> Result<(), ValidationError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::NonFinite)
    }
}

pub(crate) fn ensure_finite_point(p: Point) -> Result<(), ValidationError> {
    ensure_finite(&[p.x, p.y])
}

pub(crate) fn next_id(counter: &mut u64, prefix: &str) -> String {
    *counter += 1;
    format!("{prefix}{counter}")
}

/// Largest numeric suffix among ids carrying `prefix`.
pub(crate) fn max_suffix<'a>(ids: impl IntoIterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|rest| rest.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// A deep copy of everything persistent in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    meta: Meta,
    settings: Settings,
    levels: Vec<Level>,
    nodes: Vec<Node>,
    members: Vec<Member>,
    surfaces: Vec<Surface>,
    loads: Vec<Load>,
    supports: Vec<Support>,
    catalog: Catalog,
    counters: IdCounters,
}

/// A structural drafting document.
#[derive(Debug, Clone)]
pub struct Document {
    pub meta: Meta,
    pub settings: Settings,
    pub(crate) levels: Vec<Level>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) members: Vec<Member>,
    pub(crate) surfaces: Vec<Surface>,
    pub(crate) loads: Vec<Load>,
    pub(crate) supports: Vec<Support>,
    pub(crate) catalog: Catalog,
    pub(crate) counters: IdCounters,
    selection: Option<ElementRef>,
    active_level: LevelId,
    default_top_level: LevelId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with the two stock levels and the seeded catalog.
    pub fn new() -> Self {
        Self {
            meta: Meta::default(),
            settings: Settings::default(),
            levels: vec![
                Level { id: "L0".into(), name: "GL".into(), z: 0.0 },
                Level { id: "L1".into(), name: "2F".into(), z: 2800.0 },
            ],
            nodes: Vec::new(),
            members: Vec::new(),
            surfaces: Vec::new(),
            loads: Vec::new(),
            supports: Vec::new(),
            catalog: Catalog::new(),
            counters: IdCounters { level: 1, ..IdCounters::default() },
            selection: None,
            active_level: "L0".into(),
            default_top_level: "L1".into(),
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn supports(&self) -> &[Support] {
        &self.supports
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // --- Selection and runtime references ---

    pub fn selection(&self) -> Option<&ElementRef> {
        self.selection.as_ref()
    }

    /// Select an element. Unknown ids are rejected.
    pub fn select(&mut self, element: ElementRef) -> Result<(), ValidationError> {
        if !self.contains(&element) {
            return Err(ValidationError::NotFound(format!("{element:?}")));
        }
        self.selection = Some(element);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub(crate) fn drop_selection_of(&mut self, element: &ElementRef) {
        if self.selection.as_ref() == Some(element) {
            self.selection = None;
        }
    }

    /// Whether the referenced element exists.
    pub fn contains(&self, element: &ElementRef) -> bool {
        match element {
            ElementRef::Member(id) => self.member(id).is_some(),
            ElementRef::Surface(id) => self.surface(id).is_some(),
            ElementRef::Load(id) => self.load(id).is_some(),
            ElementRef::Support(id) => self.support(id).is_some(),
        }
    }

    /// Level new elements are placed on.
    pub fn active_level(&self) -> &str {
        &self.active_level
    }

    pub fn set_active_level(&mut self, id: &str) -> Result<(), ValidationError> {
        if self.level(id).is_none() {
            return Err(ValidationError::NotFound(id.to_string()));
        }
        self.active_level = id.to_string();
        Ok(())
    }

    /// Top level used for new walls, columns and vertical braces.
    pub fn default_top_level(&self) -> &str {
        &self.default_top_level
    }

    pub fn set_default_top_level(&mut self, id: &str) -> Result<(), ValidationError> {
        if self.level(id).is_none() {
            return Err(ValidationError::NotFound(id.to_string()));
        }
        self.default_top_level = id.to_string();
        Ok(())
    }

    /// Point runtime level references at existing levels after a load or restore.
    pub(crate) fn reset_runtime_levels(&mut self) {
        let first = self.levels.first().map(|l| l.id.clone()).unwrap_or_default();
        if self.level(&self.active_level).is_none() {
            self.active_level = first.clone();
        }
        if self.level(&self.default_top_level).is_none() {
            self.default_top_level = self.levels.get(1).map(|l| l.id.clone()).unwrap_or(first);
        }
    }

    /// Point runtime level references at the first level and the second
    /// (or first) level, as after opening a file.
    pub(crate) fn reset_level_defaults(&mut self) {
        let first = self.levels.first().map(|l| l.id.clone()).unwrap_or_default();
        self.default_top_level = self.levels.get(1).map(|l| l.id.clone()).unwrap_or_else(|| first.clone());
        self.active_level = first;
    }

    /// Level id given by the caller, or the active level. Must exist.
    pub(crate) fn level_or_active(&self, requested: Option<&str>) -> Result<LevelId, ValidationError> {
        let id = requested.unwrap_or(&self.active_level);
        if self.level(id).is_none() {
            return Err(ValidationError::NotFound(id.to_string()));
        }
        Ok(id.to_string())
    }

    // --- Snapshots ---

    /// Deep copy of the persistent state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            meta: self.meta.clone(),
            settings: self.settings.clone(),
            levels: self.levels.clone(),
            nodes: self.nodes.clone(),
            members: self.members.clone(),
            surfaces: self.surfaces.clone(),
            loads: self.loads.clone(),
            supports: self.supports.clone(),
            catalog: self.catalog.clone(),
            counters: self.counters,
        }
    }

    /// Replace the persistent state with a snapshot.
    ///
    /// Id counters only move forward, so ids handed out after the snapshot
    /// was taken are not reissued.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.meta = snapshot.meta;
        self.settings = snapshot.settings;
        self.levels = snapshot.levels;
        self.nodes = snapshot.nodes;
        self.members = snapshot.members;
        self.surfaces = snapshot.surfaces;
        self.loads = snapshot.loads;
        self.supports = snapshot.supports;
        self.catalog = snapshot.catalog;
        self.counters = self.counters.max(snapshot.counters);
        if let Some(selected) = self.selection.take() {
            if self.contains(&selected) {
                self.selection = Some(selected);
            }
        }
        self.reset_runtime_levels();
    }

    /// Swap in a freshly loaded document. Selection is dropped.
    pub(crate) fn replace_with(&mut self, loaded: Document) {
        *self = loaded;
        self.selection = None;
        self.reset_runtime_levels();
    }

    // --- Catalog edits ---

    pub fn add_section(&mut self, entry: NewSection) -> Result<SectionDefinition, ValidationError> {
        self.catalog.add_section(entry)
    }

    /// Patch a custom section and re-resolve every element bound to it.
    pub fn update_section(
        &mut self,
        kind: SectionKind,
        name: &str,
        patch: SectionPatch,
    ) -> Result<SectionDefinition, ValidationError> {
        let updated = self.catalog.update_section(kind, name, patch)?;
        let mut count = 0usize;
        match kind {
            SectionKind::Member(member_kind) => {
                for member in self.members.iter_mut() {
                    if member.kind == member_kind && member.section_name == name {
                        members::apply_member_section(&self.catalog, member);
                        count += 1;
                    }
                }
            }
            SectionKind::Surface(surface_kind) => {
                for surface in self.surfaces.iter_mut() {
                    if surface.kind == surface_kind && surface.section_name == name {
                        surfaces::apply_surface_section(&self.catalog, surface);
                        count += 1;
                    }
                }
            }
        }
        log::debug!("Section {kind}/{name} updated, re-resolved {count} elements");
        Ok(updated)
    }

    /// Whether any element is bound to the section.
    pub fn section_in_use(&self, kind: SectionKind, name: &str) -> bool {
        match kind {
            SectionKind::Member(k) => self.members.iter().any(|m| m.kind == k && m.section_name == name),
            SectionKind::Surface(k) => self.surfaces.iter().any(|s| s.kind == k && s.section_name == name),
        }
    }

    /// Remove an unused custom section.
    pub fn remove_section(&mut self, kind: SectionKind, name: &str) -> Result<(), ValidationError> {
        if self.catalog.section(kind, name).is_some_and(|s| !s.is_default) && self.section_in_use(kind, name) {
            log::debug!("Section {kind}/{name} is still referenced");
            return Err(ValidationError::InUse(format!("{kind}/{name}")));
        }
        self.catalog.remove_section(kind, name)
    }

    pub fn add_spring(&mut self, symbol: &str, memo: &str) -> Result<SpringDefinition, ValidationError> {
        self.catalog.add_spring(symbol, memo)
    }

    pub fn update_spring(&mut self, symbol: &str, memo: &str) -> Result<SpringDefinition, ValidationError> {
        self.catalog.update_spring(symbol, memo)
    }

    pub fn spring_in_use(&self, symbol: &str) -> bool {
        self.members.iter().any(|m| m.uses_spring(symbol))
    }

    /// Remove an unused custom spring.
    pub fn remove_spring(&mut self, symbol: &str) -> Result<(), ValidationError> {
        if self.catalog.spring(symbol).is_some_and(|s| !s.is_default) && self.spring_in_use(symbol) {
            return Err(ValidationError::InUse(symbol.to_string()));
        }
        self.catalog.remove_spring(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::elements::{MemberKind, SurfaceGeometry, SurfaceKind};
    use kurbo::Point;

    const BEAM: SectionKind = SectionKind::Member(MemberKind::Beam);

    fn beam(doc: &mut Document, section: Option<&str>) -> String {
        let a = doc.find_or_create_node(Point::new(0.0, 0.0), 0.01).unwrap();
        let b = doc.find_or_create_node(Point::new(5000.0, 0.0), 0.01).unwrap();
        let options = MemberOptions {
            section_name: section.map(str::to_string),
            ..MemberOptions::default()
        };
        doc.add_member(&a, &b, options).unwrap()
    }

    #[test]
    fn test_new_document_defaults() {
        let doc = Document::new();
        assert_eq!(doc.levels().len(), 2);
        assert_eq!(doc.active_level(), "L0");
        assert_eq!(doc.default_top_level(), "L1");
        assert_eq!(doc.meta.unit, "mm");
        assert!(doc.selection().is_none());
    }

    #[test]
    fn test_max_suffix() {
        let ids = ["LD2", "LD10", "L3", "LDx"];
        assert_eq!(max_suffix(ids, "LD"), 10);
        assert_eq!(max_suffix(["M1", "M7"], "M"), 7);
        assert_eq!(max_suffix(Vec::<&str>::new(), "N"), 0);
    }

    #[test]
    fn test_section_update_propagates() {
        let mut doc = Document::new();
        doc.add_section(NewSection::new(BEAM, "B1").with_size(300.0, 500.0)).unwrap();
        let bound = beam(&mut doc, Some("B1"));
        let other = beam(&mut doc, None);

        let patch = SectionPatch {
            b: Some(320.0),
            h: Some(520.0),
            color: Some(Color::rgb(0x65, 0x43, 0x21)),
        };
        doc.update_section(BEAM, "B1", patch).unwrap();

        let m = doc.member(&bound).unwrap();
        assert!((m.section.b - 320.0).abs() < f64::EPSILON);
        assert!((m.section.h - 520.0).abs() < f64::EPSILON);
        assert_eq!(m.color.to_hex(), "#654321");

        let untouched = doc.member(&other).unwrap();
        assert_eq!(untouched.section_name, "_G");
        assert!((untouched.section.b - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_surface_section_update_propagates() {
        let mut doc = Document::new();
        let kind = SectionKind::Surface(SurfaceKind::ExteriorWall);
        doc.add_section(NewSection::new(kind, "OW_RED").with_color(Color::rgb(0xaa, 0x33, 0x44)))
            .unwrap();
        let geometry = SurfaceGeometry::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(4000.0, 0.0),
            Point::new(4000.0, 3000.0),
        ]);
        let options = SurfaceOptions {
            kind: Some(SurfaceKind::ExteriorWall),
            ..SurfaceOptions::default()
        };
        let id = doc.add_surface(geometry, options).unwrap();
        assert_eq!(doc.surface(&id).unwrap().color, Color::WALL);

        let patch = SurfacePatch {
            section_name: Some("OW_RED".into()),
            ..SurfacePatch::default()
        };
        doc.update_surface(&id, patch).unwrap();
        assert_eq!(doc.surface(&id).unwrap().color.to_hex(), "#aa3344");

        let recolor = SectionPatch {
            color: Some(Color::rgb(0x33, 0x55, 0x77)),
            ..SectionPatch::default()
        };
        doc.update_section(kind, "OW_RED", recolor).unwrap();
        assert_eq!(doc.surface(&id).unwrap().color.to_hex(), "#335577");

        let direct = SurfacePatch {
            color: Some(Color::rgb(0xff, 0xff, 0xff)),
            ..SurfacePatch::default()
        };
        doc.update_surface(&id, direct).unwrap();
        assert_eq!(doc.surface(&id).unwrap().color.to_hex(), "#335577");
    }

    #[test]
    fn test_remove_section_in_use() {
        let mut doc = Document::new();
        doc.add_section(NewSection::new(BEAM, "B_REMOVE")).unwrap();
        let id = beam(&mut doc, Some("B_REMOVE"));

        assert!(matches!(doc.remove_section(BEAM, "_G"), Err(ValidationError::DefaultEntry(_))));
        assert!(matches!(doc.remove_section(BEAM, "B_REMOVE"), Err(ValidationError::InUse(_))));

        let patch = MemberPatch {
            section_name: Some("_G".into()),
            ..MemberPatch::default()
        };
        doc.update_member(&id, patch).unwrap();
        assert!(doc.remove_section(BEAM, "B_REMOVE").is_ok());
    }

    #[test]
    fn test_remove_spring_in_use() {
        use crate::elements::EndFixity;

        let mut doc = Document::new();
        doc.add_spring("SP_REMOVE", "test spring").unwrap();
        let id = beam(&mut doc, None);
        let patch = MemberPatch {
            end_i: Some(EndFixity::spring("SP_REMOVE")),
            ..MemberPatch::default()
        };
        doc.update_member(&id, patch).unwrap();

        assert!(doc.remove_spring("_SP").is_err());
        assert!(matches!(doc.remove_spring("SP_REMOVE"), Err(ValidationError::InUse(_))));

        let patch = MemberPatch {
            end_i: Some(EndFixity::rigid()),
            ..MemberPatch::default()
        };
        doc.update_member(&id, patch).unwrap();
        assert!(doc.remove_spring("SP_REMOVE").is_ok());
    }

    #[test]
    fn test_selection_cleared_on_remove() {
        let mut doc = Document::new();
        let id = beam(&mut doc, None);
        doc.select(ElementRef::Member(id.clone())).unwrap();
        doc.remove_member(&id).unwrap();
        assert!(doc.selection().is_none());
        assert!(doc.select(ElementRef::Member(id)).is_err());
    }

    #[test]
    fn test_restore_keeps_counters_monotonic() {
        let mut doc = Document::new();
        let before = doc.snapshot();
        let first = beam(&mut doc, None);
        assert_eq!(first, "M1");
        doc.restore(before);
        assert!(doc.members().is_empty());
        let second = beam(&mut doc, None);
        assert_eq!(second, "M2");
    }

    #[test]
    fn test_restore_drops_stale_selection() {
        let mut doc = Document::new();
        let before = doc.snapshot();
        let id = beam(&mut doc, None);
        doc.select(ElementRef::Member(id)).unwrap();
        doc.restore(before);
        assert!(doc.selection().is_none());
    }
}
