//! Versioned JSON document files and the user-definitions exchange file.
//!
//! The wire records here are kept separate from the in-memory model: element
//! ids are not written, every field is optional on read, and legacy spellings
//! from older schema versions are accepted. Loading builds a complete new
//! [`Document`] before anything replaces the live one.

use crate::catalog::{Catalog, NewSection, SectionDefinition, SectionKind, SpringDefinition};
use crate::color::{Color, deserialize_lenient};
use crate::config::Settings;
use crate::document::{
    Document, LEVEL_PREFIX, LOAD_PREFIX, MEMBER_PREFIX, Meta, NODE_PREFIX, SUPPORT_PREFIX, SURFACE_PREFIX,
    apply_member_section, apply_surface_section, max_suffix,
};
use crate::elements::{
    BracePattern, EndCondition, EndFixity, Level, Load, LoadDirection, LoadKind, LoadType, Member, MemberKind,
    Node, PointForces, Restraints, SectionSize, Support, Surface, SurfaceGeometry, SurfaceKind, SurfaceShape,
    positive_or,
};
use crate::error::{FormatError, FormatResult};
use crate::geometry::rect_from_corners;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Version written by [`Document::to_json`].
pub const SCHEMA_VERSION: i64 = 3;

/// Oldest version still readable.
pub const MIN_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentFile {
    #[serde(default)]
    schema_version: Option<i64>,
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    levels: Vec<LevelRecord>,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    section_catalog: Vec<SectionRecord>,
    #[serde(default)]
    spring_catalog: Vec<SpringRecord>,
    #[serde(default)]
    members: Vec<MemberRecord>,
    #[serde(default)]
    surfaces: Vec<SurfaceRecord>,
    #[serde(default)]
    loads: Vec<LoadRecord>,
    #[serde(default)]
    supports: Vec<SupportRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LevelRecord {
    id: Option<String>,
    name: Option<String>,
    z: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NodeRecord {
    id: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionRecord {
    target: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    name: Option<String>,
    material: Option<String>,
    b: Option<f64>,
    h: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    color: Option<Color>,
    is_default: Option<bool>,
}

impl SectionRecord {
    fn to_new_section(&self) -> Option<NewSection> {
        let kind = SectionKind::parse(self.target.as_deref()?, self.type_name.as_deref()?)?;
        Some(NewSection {
            kind,
            name: self.name.clone()?,
            material: self.material.clone(),
            b: self.b,
            h: self.h,
            color: self.color,
        })
    }

    /// Normalized definition, or `None` for entries with no usable key.
    fn to_definition(&self) -> Option<SectionDefinition> {
        self.to_new_section()?.normalize().ok()
    }
}

impl From<&SectionDefinition> for SectionRecord {
    fn from(section: &SectionDefinition) -> Self {
        Self {
            target: Some(section.kind.target().as_str().to_string()),
            type_name: Some(section.kind.type_name().to_string()),
            name: Some(section.name.clone()),
            material: Some(section.material.clone()),
            b: section.size.map(|s| s.b),
            h: section.size.map(|s| s.h),
            color: Some(section.color),
            is_default: Some(section.is_default),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpringRecord {
    symbol: Option<String>,
    /// Older files name springs instead of giving a symbol.
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    memo: Option<String>,
    is_default: Option<bool>,
}

impl SpringRecord {
    fn symbol(&self) -> Option<&str> {
        self.symbol
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn memo(&self) -> &str {
        self.memo.as_deref().map(str::trim).unwrap_or_default()
    }

    fn to_definition(&self) -> Option<SpringDefinition> {
        Some(SpringDefinition {
            symbol: self.symbol()?.to_string(),
            memo: self.memo().to_string(),
            is_default: false,
        })
    }
}

impl From<&SpringDefinition> for SpringRecord {
    fn from(spring: &SpringDefinition) -> Self {
        Self {
            symbol: Some(spring.symbol.clone()),
            name: None,
            memo: Some(spring.memo.clone()),
            is_default: Some(spring.is_default),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SizeRecord {
    b: Option<f64>,
    h: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndRecord {
    #[serde(alias = "fixity", alias = "type")]
    condition: Option<String>,
    #[serde(alias = "symbol")]
    spring_symbol: Option<String>,
}

impl EndRecord {
    fn to_fixity(&self) -> EndFixity {
        let condition = self
            .condition
            .as_deref()
            .and_then(|c| c.parse::<EndCondition>().ok())
            .unwrap_or_default();
        EndFixity {
            condition,
            spring_symbol: self.spring_symbol.clone(),
        }
    }
}

impl From<&EndFixity> for EndRecord {
    fn from(end: &EndFixity) -> Self {
        Self {
            condition: Some(end.condition.as_str().to_string()),
            spring_symbol: end.spring_symbol.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberRecord {
    #[serde(rename = "type")]
    type_name: Option<String>,
    start_node_id: Option<String>,
    end_node_id: Option<String>,
    section_name: Option<String>,
    /// Inline dimensions written by schema versions before the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    section: Option<SizeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    material: Option<String>,
    level_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    color: Option<Color>,
    top_level_id: Option<String>,
    brace_pattern: Option<String>,
    #[serde(alias = "iEnd")]
    end_i: Option<EndRecord>,
    #[serde(alias = "jEnd")]
    end_j: Option<EndRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PointRecord {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

impl From<Point> for PointRecord {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurfaceRecord {
    #[serde(rename = "type")]
    type_name: Option<String>,
    section_name: Option<String>,
    level_id: Option<String>,
    top_level_id: Option<String>,
    load_direction: Option<LoadDirection>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    color: Option<Color>,
    x1: Option<f64>,
    y1: Option<f64>,
    x2: Option<f64>,
    y2: Option<f64>,
    shape: Option<SurfaceShape>,
    points: Option<Vec<PointRecord>>,
}

impl SurfaceRecord {
    fn corners(&self) -> (Point, Point) {
        (
            Point::new(self.x1.unwrap_or_default(), self.y1.unwrap_or_default()),
            Point::new(self.x2.unwrap_or_default(), self.y2.unwrap_or_default()),
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadRecord {
    #[serde(rename = "type")]
    load_type: Option<LoadType>,
    level_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    color: Option<Color>,
    x1: Option<f64>,
    y1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    my: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mz: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupportRecord {
    x: Option<f64>,
    y: Option<f64>,
    level_id: Option<String>,
    dx: Option<bool>,
    dy: Option<bool>,
    dz: Option<bool>,
    rx: Option<bool>,
    ry: Option<bool>,
    rz: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDefinitionsFile {
    #[serde(default)]
    user_definitions: bool,
    #[serde(default)]
    sections: Vec<SectionRecord>,
    #[serde(default)]
    springs: Vec<SpringRecord>,
}

/// Read `schemaVersion`, treating a missing value as version 1.
fn schema_version(data: &Value) -> FormatResult<i64> {
    // Files written before versioning carry no field, or an explicit 0.
    let version = match data.get("schemaVersion") {
        None | Some(Value::Null) => return Ok(MIN_SCHEMA_VERSION),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| FormatError::Invalid(format!("schemaVersion is not an integer: {v}")))?,
    };
    if version == 0 {
        return Ok(MIN_SCHEMA_VERSION);
    }
    if !(MIN_SCHEMA_VERSION..=SCHEMA_VERSION).contains(&version) {
        return Err(FormatError::UnsupportedVersion(version));
    }
    Ok(version)
}

fn parse_member_kind(name: Option<&str>) -> FormatResult<MemberKind> {
    match name {
        None => Ok(MemberKind::default()),
        Some(name) => name.parse().map_err(FormatError::Invalid),
    }
}

fn parse_surface_kind(name: Option<&str>) -> FormatResult<SurfaceKind> {
    match name {
        None => Ok(SurfaceKind::default()),
        Some(name) => name.parse().map_err(FormatError::Invalid),
    }
}

/// Build a document from file text. `previous` supplies custom catalog
/// entries to carry over when their keys are not taken by the file.
fn parse_document(text: &str, previous: Option<&Catalog>) -> FormatResult<Document> {
    let data: Value = serde_json::from_str(text)?;
    if !data.is_object() {
        return Err(FormatError::Invalid("expected a JSON object".to_string()));
    }
    let version = schema_version(&data)?;
    let file: DocumentFile = serde_json::from_value(data)?;
    log::debug!("Reading schema version {version}");

    let mut doc = Document::new();
    doc.meta = file.meta;
    doc.settings = file.settings;
    if !file.levels.is_empty() {
        doc.levels = hydrate_levels(file.levels)?;
    }
    doc.reset_level_defaults();
    doc.nodes = hydrate_nodes(file.nodes)?;

    let sections = file.section_catalog.iter().filter_map(SectionRecord::to_definition).collect();
    let springs = file.spring_catalog.iter().filter_map(SpringRecord::to_definition).collect();
    doc.catalog = Catalog::hydrate(sections, springs)?;
    if let Some(previous) = previous {
        doc.catalog.retain_custom_from(previous);
    }

    for (idx, record) in file.members.into_iter().enumerate() {
        let member = doc.hydrate_member(idx, record)?;
        doc.members.push(member);
    }
    for (idx, record) in file.surfaces.into_iter().enumerate() {
        let surface = doc.hydrate_surface(idx, record)?;
        doc.surfaces.push(surface);
    }
    for (idx, record) in file.loads.into_iter().enumerate() {
        let load = doc.hydrate_load(idx, record)?;
        doc.loads.push(load);
    }
    for (idx, record) in file.supports.into_iter().enumerate() {
        let support = doc.hydrate_support(idx, record)?;
        doc.supports.push(support);
    }

    doc.counters.node = max_suffix(doc.nodes.iter().map(|n| n.id.as_str()), NODE_PREFIX);
    doc.counters.member = max_suffix(doc.members.iter().map(|m| m.id.as_str()), MEMBER_PREFIX);
    doc.counters.surface = max_suffix(doc.surfaces.iter().map(|s| s.id.as_str()), SURFACE_PREFIX);
    doc.counters.level = max_suffix(doc.levels.iter().map(|l| l.id.as_str()), LEVEL_PREFIX);
    doc.counters.load = max_suffix(doc.loads.iter().map(|l| l.id.as_str()), LOAD_PREFIX);
    doc.counters.support = max_suffix(doc.supports.iter().map(|s| s.id.as_str()), SUPPORT_PREFIX);
    Ok(doc)
}

fn hydrate_levels(records: Vec<LevelRecord>) -> FormatResult<Vec<Level>> {
    let mut levels: Vec<Level> = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        let id = record
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{LEVEL_PREFIX}{idx}"));
        let z = record.z.unwrap_or_default();
        if levels.iter().any(|l| l.id == id) {
            return Err(FormatError::Invalid(format!("duplicate level id {id}")));
        }
        if levels.iter().any(|l| l.z == z) {
            return Err(FormatError::Invalid(format!("duplicate level elevation {z}")));
        }
        let name = record.name.unwrap_or_else(|| id.clone());
        levels.push(Level { id, name, z });
    }
    Ok(levels)
}

fn hydrate_nodes(records: Vec<NodeRecord>) -> FormatResult<Vec<Node>> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        let id = record.id.unwrap_or_else(|| format!("{NODE_PREFIX}{}", idx + 1));
        if !seen.insert(id.clone()) {
            return Err(FormatError::Invalid(format!("duplicate node id {id}")));
        }
        let position = Point::new(record.x.unwrap_or_default(), record.y.unwrap_or_default());
        nodes.push(Node { id, position });
    }
    Ok(nodes)
}

impl Document {
    /// Level id from a record, or `fallback`. Must name an existing level.
    fn hydrate_level_ref(&self, requested: Option<String>, fallback: &str, owner: &str) -> FormatResult<String> {
        let id = requested.filter(|id| !id.is_empty()).unwrap_or_else(|| fallback.to_string());
        if self.level(&id).is_none() {
            return Err(FormatError::Invalid(format!("{owner} references missing level {id}")));
        }
        Ok(id)
    }

    fn hydrate_member(&mut self, idx: usize, record: MemberRecord) -> FormatResult<Member> {
        let id = format!("{MEMBER_PREFIX}{}", idx + 1);
        let kind = parse_member_kind(record.type_name.as_deref())?;
        let mut ends = Vec::with_capacity(2);
        for node in [&record.start_node_id, &record.end_node_id] {
            let node = node.clone().unwrap_or_default();
            if self.node(&node).is_none() {
                return Err(FormatError::MissingNode { member: idx, node });
            }
            ends.push(node);
        }
        let level_id = self.hydrate_level_ref(record.level_id, self.active_level(), &id)?;
        let top_level_id = match record.top_level_id.filter(|t| !t.is_empty()) {
            Some(top) => Some(self.hydrate_level_ref(Some(top), "", &id)?),
            None if kind.is_vertical() => Some(self.default_top_level().to_string()),
            None => None,
        };

        let color = record.color.unwrap_or(Color::MEMBER);
        let size = SectionSize::new(
            positive_or(record.section.as_ref().and_then(|s| s.b), SectionSize::DEFAULT_B),
            positive_or(record.section.as_ref().and_then(|s| s.h), SectionSize::DEFAULT_H),
        );
        let material = record
            .material
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(crate::catalog::DEFAULT_MATERIAL)
            .to_string();
        let mut section_name = record.section_name.unwrap_or_default().trim().to_string();
        let named = !section_name.is_empty() && self.catalog.section(SectionKind::Member(kind), &section_name).is_some();
        if !named && (record.section.is_some() || record.material.is_some()) {
            section_name = self.catalog.find_or_create_member_section(kind, &material, size, color);
        }

        let mut member = Member {
            id,
            kind,
            start_node: ends.remove(0),
            end_node: ends.remove(0),
            section_name,
            section: size,
            material,
            color,
            level_id,
            top_level_id,
            brace_pattern: match record.brace_pattern.as_deref() {
                Some("cross") => BracePattern::Cross,
                _ => BracePattern::Single,
            },
            end_i: self.catalog.normalize_end(&record.end_i.unwrap_or_default().to_fixity()),
            end_j: self.catalog.normalize_end(&record.end_j.unwrap_or_default().to_fixity()),
        };
        apply_member_section(&self.catalog, &mut member);
        Ok(member)
    }

    fn hydrate_surface(&self, idx: usize, record: SurfaceRecord) -> FormatResult<Surface> {
        let id = format!("{SURFACE_PREFIX}{}", idx + 1);
        let kind = parse_surface_kind(record.type_name.as_deref())?;
        let (a, b) = record.corners();
        let geometry = match record.shape.unwrap_or_default() {
            SurfaceShape::Rect => SurfaceGeometry::rect(a, b),
            SurfaceShape::Line => match record.points.as_deref() {
                Some([start, end, ..]) => SurfaceGeometry::Line {
                    start: Point::new(start.x, start.y),
                    end: Point::new(end.x, end.y),
                },
                _ => SurfaceGeometry::Line { start: a, end: b },
            },
            SurfaceShape::Polygon => {
                let points: Vec<Point> = record
                    .points
                    .unwrap_or_default()
                    .iter()
                    .map(|p| Point::new(p.x, p.y))
                    .collect();
                if points.len() < 3 {
                    return Err(FormatError::Invalid(format!(
                        "surface {id} has {} polygon points",
                        points.len()
                    )));
                }
                SurfaceGeometry::Polygon(points)
            }
        };
        let level_id = self.hydrate_level_ref(record.level_id, self.active_level(), &id)?;
        let top_level_id = self.hydrate_level_ref(record.top_level_id, self.default_top_level(), &id)?;

        let mut surface = Surface {
            id,
            kind,
            section_name: record.section_name.unwrap_or_default(),
            color: record.color.unwrap_or_else(|| kind.default_color()),
            level_id,
            top_level_id,
            load_direction: record.load_direction.unwrap_or_default(),
            geometry,
        };
        apply_surface_section(&self.catalog, &mut surface);
        Ok(surface)
    }

    fn hydrate_load(&self, idx: usize, record: LoadRecord) -> FormatResult<Load> {
        let id = format!("{LOAD_PREFIX}{}", idx + 1);
        let first = Point::new(record.x1.unwrap_or_default(), record.y1.unwrap_or_default());
        let second = Point::new(record.x2.unwrap_or_default(), record.y2.unwrap_or_default());
        let value = record.value.unwrap_or_default();
        let kind = match record.load_type.unwrap_or_default() {
            LoadType::AreaLoad => LoadKind::Area {
                rect: rect_from_corners(first, second),
                value,
            },
            LoadType::LineLoad => LoadKind::Line {
                start: first,
                end: second,
                value,
            },
            LoadType::PointLoad => LoadKind::Point {
                at: first,
                forces: PointForces {
                    fx: record.fx.unwrap_or_default(),
                    fy: record.fy.unwrap_or_default(),
                    fz: record.fz.unwrap_or_default(),
                    mx: record.mx.unwrap_or_default(),
                    my: record.my.unwrap_or_default(),
                    mz: record.mz.unwrap_or_default(),
                },
            },
        };
        let level_id = self.hydrate_level_ref(record.level_id, self.active_level(), &id)?;
        Ok(Load {
            id,
            level_id,
            color: record.color.unwrap_or_else(|| kind.load_type().default_color()),
            kind,
        })
    }

    fn hydrate_support(&self, idx: usize, record: SupportRecord) -> FormatResult<Support> {
        let id = format!("{SUPPORT_PREFIX}{}", idx + 1);
        let level_id = self.hydrate_level_ref(record.level_id, self.active_level(), &id)?;
        Ok(Support {
            id,
            position: Point::new(record.x.unwrap_or_default(), record.y.unwrap_or_default()),
            level_id,
            restraints: Restraints {
                dx: record.dx.unwrap_or_default(),
                dy: record.dy.unwrap_or_default(),
                dz: record.dz.unwrap_or_default(),
                rx: record.rx.unwrap_or_default(),
                ry: record.ry.unwrap_or_default(),
                rz: record.rz.unwrap_or_default(),
            },
        })
    }

    fn to_file(&self) -> DocumentFile {
        DocumentFile {
            schema_version: Some(SCHEMA_VERSION),
            meta: self.meta.clone(),
            settings: self.settings.clone(),
            levels: self
                .levels
                .iter()
                .map(|l| LevelRecord {
                    id: Some(l.id.clone()),
                    name: Some(l.name.clone()),
                    z: Some(l.z),
                })
                .collect(),
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeRecord {
                    id: Some(n.id.clone()),
                    x: Some(n.position.x),
                    y: Some(n.position.y),
                })
                .collect(),
            section_catalog: self
                .catalog
                .sections()
                .iter()
                .filter(|s| s.is_default || self.section_in_use(s.kind, &s.name))
                .map(SectionRecord::from)
                .collect(),
            spring_catalog: self
                .catalog
                .springs()
                .iter()
                .filter(|s| s.is_default || self.spring_in_use(&s.symbol))
                .map(SpringRecord::from)
                .collect(),
            members: self.members.iter().map(member_record).collect(),
            surfaces: self.surfaces.iter().map(surface_record).collect(),
            loads: self.loads.iter().map(load_record).collect(),
            supports: self.supports.iter().map(support_record).collect(),
        }
    }

    /// Serialize to the current schema. Custom catalog entries are written
    /// only when an element references them.
    pub fn to_json(&self) -> FormatResult<String> {
        let json = serde_json::to_string_pretty(&self.to_file())?;
        Ok(json)
    }

    /// Parse a document file into a new document.
    pub fn from_json(text: &str) -> FormatResult<Document> {
        parse_document(text, None)
    }

    /// Replace this document with the file's contents. Custom catalog entries
    /// already in memory are kept unless the file defines the same key. On
    /// error nothing is modified.
    pub fn load_json(&mut self, text: &str) -> FormatResult<()> {
        let loaded = parse_document(text, Some(&self.catalog))?;
        self.replace_with(loaded);
        log::info!(
            "Loaded document {:?}: {} members, {} surfaces, {} loads, {} supports",
            self.meta.name,
            self.members.len(),
            self.surfaces.len(),
            self.loads.len(),
            self.supports.len()
        );
        Ok(())
    }

    /// Serialize every custom catalog entry. Returns `None` when there are none.
    pub fn export_user_definitions(&self) -> FormatResult<Option<String>> {
        let file = UserDefinitionsFile {
            user_definitions: true,
            sections: self.catalog.custom_sections().map(SectionRecord::from).collect(),
            springs: self.catalog.custom_springs().map(SpringRecord::from).collect(),
        };
        if file.sections.is_empty() && file.springs.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::to_string_pretty(&file)?))
    }

    /// Add the custom entries of a user-definitions file through the normal
    /// catalog checks. Entries that are rejected are skipped. Returns the
    /// number added.
    pub fn import_user_definitions(&mut self, text: &str) -> FormatResult<usize> {
        let file: UserDefinitionsFile = serde_json::from_str(text)?;
        if !file.user_definitions {
            return Err(FormatError::NotUserDefinitions);
        }
        let mut count = 0;
        for record in file.sections.iter().filter(|r| r.is_default != Some(true)) {
            let Some(entry) = record.to_new_section() else {
                continue;
            };
            match self.add_section(entry) {
                Ok(_) => count += 1,
                Err(err) => log::debug!("Skipping imported section: {err}"),
            }
        }
        for record in file.springs.iter().filter(|r| r.is_default != Some(true)) {
            let Some(symbol) = record.symbol() else {
                continue;
            };
            match self.add_spring(symbol, record.memo()) {
                Ok(_) => count += 1,
                Err(err) => log::debug!("Skipping imported spring: {err}"),
            }
        }
        log::info!("Imported {count} user definitions");
        Ok(count)
    }
}

fn member_record(member: &Member) -> MemberRecord {
    MemberRecord {
        type_name: Some(member.kind.as_str().to_string()),
        start_node_id: Some(member.start_node.clone()),
        end_node_id: Some(member.end_node.clone()),
        section_name: Some(member.section_name.clone()),
        section: None,
        material: None,
        level_id: Some(member.level_id.clone()),
        color: Some(member.color),
        top_level_id: member.top_level_id.clone(),
        brace_pattern: Some(
            match member.brace_pattern {
                BracePattern::Single => "single",
                BracePattern::Cross => "cross",
            }
            .to_string(),
        ),
        end_i: Some(EndRecord::from(&member.end_i)),
        end_j: Some(EndRecord::from(&member.end_j)),
    }
}

fn surface_record(surface: &Surface) -> SurfaceRecord {
    let (x1, y1, x2, y2) = match &surface.geometry {
        SurfaceGeometry::Line { start, end } => (start.x, start.y, end.x, end.y),
        other => {
            let b = other.bounds();
            (b.x0, b.y0, b.x1, b.y1)
        }
    };
    SurfaceRecord {
        type_name: Some(surface.kind.as_str().to_string()),
        section_name: Some(surface.section_name.clone()),
        level_id: Some(surface.level_id.clone()),
        top_level_id: Some(surface.top_level_id.clone()),
        load_direction: Some(surface.load_direction),
        color: Some(surface.color),
        x1: Some(x1),
        y1: Some(y1),
        x2: Some(x2),
        y2: Some(y2),
        shape: Some(surface.shape()),
        points: surface
            .geometry
            .points()
            .map(|points| points.into_iter().map(PointRecord::from).collect()),
    }
}

fn load_record(load: &Load) -> LoadRecord {
    let mut record = LoadRecord {
        load_type: Some(load.load_type()),
        level_id: Some(load.level_id.clone()),
        color: Some(load.color),
        ..LoadRecord::default()
    };
    match &load.kind {
        LoadKind::Area { rect, value } => {
            record.x1 = Some(rect.x0);
            record.y1 = Some(rect.y0);
            record.x2 = Some(rect.x1);
            record.y2 = Some(rect.y1);
            record.value = Some(*value);
        }
        LoadKind::Line { start, end, value } => {
            record.x1 = Some(start.x);
            record.y1 = Some(start.y);
            record.x2 = Some(end.x);
            record.y2 = Some(end.y);
            record.value = Some(*value);
        }
        LoadKind::Point { at, forces } => {
            record.x1 = Some(at.x);
            record.y1 = Some(at.y);
            record.fx = Some(forces.fx);
            record.fy = Some(forces.fy);
            record.fz = Some(forces.fz);
            record.mx = Some(forces.mx);
            record.my = Some(forces.my);
            record.mz = Some(forces.mz);
        }
    }
    record
}

fn support_record(support: &Support) -> SupportRecord {
    let r = support.restraints;
    SupportRecord {
        x: Some(support.position.x),
        y: Some(support.position.y),
        level_id: Some(support.level_id.clone()),
        dx: Some(r.dx),
        dy: Some(r.dy),
        dz: Some(r.dz),
        rx: Some(r.rx),
        ry: Some(r.ry),
        rz: Some(r.rz),
    }
}
