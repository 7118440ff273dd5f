//! Section and spring catalogs.
//!
//! Elements never store their display attributes directly. They name a
//! catalog entry, and the document resolves `section`, `material` and `color`
//! from it. Default entries are seeded on construction and can be neither
//! edited nor removed; custom entries are free-form but may not use the
//! reserved name prefix.

use crate::color::Color;
use crate::elements::{EndCondition, EndFixity, MemberKind, SectionSize, SurfaceKind, positive_or};
use crate::error::{FormatError, FormatResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names starting with this character belong to the seeded defaults.
pub const RESERVED_PREFIX: char = '_';

/// Material assumed for member sections that do not name one.
pub const DEFAULT_MATERIAL: &str = "steel";

/// Which element family a section applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionTarget {
    Member,
    Surface,
}

impl SectionTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionTarget::Member => "member",
            SectionTarget::Surface => "surface",
        }
    }
}

/// Catalog key minus the name: `(target, type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Member(MemberKind),
    Surface(SurfaceKind),
}

impl SectionKind {
    pub fn target(self) -> SectionTarget {
        match self {
            SectionKind::Member(_) => SectionTarget::Member,
            SectionKind::Surface(_) => SectionTarget::Surface,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            SectionKind::Member(kind) => kind.as_str(),
            SectionKind::Surface(kind) => kind.as_str(),
        }
    }

    /// Parse a wire `(target, type)` pair. Member types go through the alias table.
    pub fn parse(target: &str, type_name: &str) -> Option<Self> {
        match target.trim() {
            "member" => type_name.parse().ok().map(SectionKind::Member),
            "surface" => type_name.parse().ok().map(SectionKind::Surface),
            _ => None,
        }
    }

    pub fn default_color(self) -> Color {
        match self {
            SectionKind::Member(_) => Color::MEMBER,
            SectionKind::Surface(kind) => kind.default_color(),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target().as_str(), self.type_name())
    }
}

/// A named bundle of display and dimension attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDefinition {
    pub kind: SectionKind,
    pub name: String,
    /// Always set for member sections, usually empty for surfaces.
    pub material: String,
    /// Dimensions; `None` for surface sections.
    pub size: Option<SectionSize>,
    pub color: Color,
    pub is_default: bool,
}

impl SectionDefinition {
    fn seeded(kind: SectionKind, name: &str, size: Option<SectionSize>) -> Self {
        let material = match kind {
            SectionKind::Member(_) => DEFAULT_MATERIAL.to_string(),
            SectionKind::Surface(_) => String::new(),
        };
        Self {
            kind,
            name: name.to_string(),
            material,
            size,
            color: kind.default_color(),
            is_default: true,
        }
    }

    /// Member dimensions, falling back to the stock 200 x 400.
    pub fn resolved_size(&self) -> SectionSize {
        self.size.unwrap_or_default()
    }

    /// Material, falling back to steel.
    pub fn resolved_material(&self) -> &str {
        if self.material.is_empty() {
            DEFAULT_MATERIAL
        } else {
            &self.material
        }
    }

    /// True when both entries describe the same section, ignoring `is_default`.
    pub fn same_content(&self, other: &SectionDefinition) -> bool {
        if self.kind != other.kind || self.name != other.name || self.material != other.material {
            return false;
        }
        if self.color != other.color {
            return false;
        }
        match self.kind {
            SectionKind::Member(_) => self.resolved_size() == other.resolved_size(),
            SectionKind::Surface(_) => true,
        }
    }
}

/// Input for a new custom section. Missing fields get type defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSection {
    pub kind: SectionKind,
    pub name: String,
    pub material: Option<String>,
    pub b: Option<f64>,
    pub h: Option<f64>,
    pub color: Option<Color>,
}

impl NewSection {
    pub fn new(kind: SectionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            material: None,
            b: None,
            h: None,
            color: None,
        }
    }

    pub fn with_size(mut self, b: f64, h: f64) -> Self {
        self.b = Some(b);
        self.h = Some(h);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Fill in defaults and trim text. Fails only on an empty name.
    pub(crate) fn normalize(self) -> Result<SectionDefinition, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let material = self.material.as_deref().map(str::trim).unwrap_or_default();
        let (material, size) = match self.kind {
            SectionKind::Member(_) => {
                let material = if material.is_empty() { DEFAULT_MATERIAL } else { material };
                let size = SectionSize::new(
                    positive_or(self.b, SectionSize::DEFAULT_B),
                    positive_or(self.h, SectionSize::DEFAULT_H),
                );
                (material.to_string(), Some(size))
            }
            SectionKind::Surface(_) => (material.to_string(), None),
        };
        Ok(SectionDefinition {
            kind: self.kind,
            name,
            material,
            size,
            color: self.color.unwrap_or_else(|| self.kind.default_color()),
            is_default: false,
        })
    }
}

/// Editable fields of a custom section. Dimensions are ignored for surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionPatch {
    pub b: Option<f64>,
    pub h: Option<f64>,
    pub color: Option<Color>,
}

/// A rotational spring that member ends can reference by symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpringDefinition {
    pub symbol: String,
    pub memo: String,
    pub is_default: bool,
}

fn default_sections() -> Vec<SectionDefinition> {
    use SectionKind::{Member, Surface};
    vec![
        SectionDefinition::seeded(Member(MemberKind::Beam), "_G", Some(SectionSize::new(200.0, 400.0))),
        SectionDefinition::seeded(Member(MemberKind::Column), "_C", Some(SectionSize::new(105.0, 105.0))),
        SectionDefinition::seeded(Member(MemberKind::HBrace), "_H", Some(SectionSize::new(20.0, 20.0))),
        SectionDefinition::seeded(Member(MemberKind::VBrace), "_V", Some(SectionSize::new(20.0, 20.0))),
        SectionDefinition::seeded(Surface(SurfaceKind::Floor), "_S", None),
        SectionDefinition::seeded(Surface(SurfaceKind::ExteriorWall), "_OW", None),
        SectionDefinition::seeded(Surface(SurfaceKind::Wall), "_IW", None),
    ]
}

fn default_springs() -> Vec<SpringDefinition> {
    vec![SpringDefinition {
        symbol: "_SP".to_string(),
        memo: "回転バネ".to_string(),
        is_default: true,
    }]
}

fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Keyed tables of section and spring definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    sections: Vec<SectionDefinition>,
    springs: Vec<SpringDefinition>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create a catalog holding only the seeded defaults.
    pub fn new() -> Self {
        Self {
            sections: default_sections(),
            springs: default_springs(),
        }
    }

    /// Build a catalog from file entries on top of the defaults.
    ///
    /// Entries carrying a default name must match that default exactly and
    /// are then dropped; anything else sharing a key with an earlier entry is
    /// a duplicate.
    pub(crate) fn hydrate(
        sections: Vec<SectionDefinition>,
        springs: Vec<SpringDefinition>,
    ) -> FormatResult<Self> {
        let mut catalog = Self::new();
        let defaults = default_sections();
        for mut entry in sections {
            if let Some(default) = defaults.iter().find(|d| d.name == entry.name) {
                if !default.same_content(&entry) {
                    return Err(FormatError::ReservedCollision(entry.name));
                }
                continue;
            }
            if catalog.section(entry.kind, &entry.name).is_some() {
                return Err(FormatError::DuplicateEntry(format!("{}/{}", entry.kind, entry.name)));
            }
            entry.is_default = false;
            catalog.sections.push(entry);
        }

        let default_springs = default_springs();
        for mut entry in springs {
            if let Some(default) = default_springs.iter().find(|d| d.symbol == entry.symbol) {
                if default.memo != entry.memo {
                    return Err(FormatError::ReservedCollision(entry.symbol));
                }
                continue;
            }
            if catalog.spring(&entry.symbol).is_some() {
                return Err(FormatError::DuplicateEntry(entry.symbol));
            }
            entry.is_default = false;
            catalog.springs.push(entry);
        }
        Ok(catalog)
    }

    /// Carry over custom entries from `previous` whose keys are still free.
    pub(crate) fn retain_custom_from(&mut self, previous: &Catalog) {
        for entry in previous.custom_sections() {
            if self.section(entry.kind, &entry.name).is_none() {
                self.sections.push(entry.clone());
            }
        }
        for entry in previous.custom_springs() {
            if self.spring(&entry.symbol).is_none() {
                self.springs.push(entry.clone());
            }
        }
    }

    pub fn sections(&self) -> &[SectionDefinition] {
        &self.sections
    }

    pub fn springs(&self) -> &[SpringDefinition] {
        &self.springs
    }

    pub fn custom_sections(&self) -> impl Iterator<Item = &SectionDefinition> {
        self.sections.iter().filter(|s| !s.is_default)
    }

    pub fn custom_springs(&self) -> impl Iterator<Item = &SpringDefinition> {
        self.springs.iter().filter(|s| !s.is_default)
    }

    /// Sections of one kind, defaults first and then by name.
    pub fn list_sections(&self, kind: SectionKind) -> Vec<&SectionDefinition> {
        let mut list: Vec<_> = self.sections.iter().filter(|s| s.kind == kind).collect();
        list.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.name.cmp(&b.name)));
        list
    }

    /// Exact lookup by key.
    pub fn section(&self, kind: SectionKind, name: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.kind == kind && s.name == name)
    }

    pub fn default_section(&self, kind: SectionKind) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.kind == kind && s.is_default)
    }

    /// Resolve a requested name: exact match, then the type's default, then
    /// the first entry of that type.
    pub fn resolve_section(&self, kind: SectionKind, requested: &str) -> Option<&SectionDefinition> {
        let requested = requested.trim();
        let exact = if requested.is_empty() {
            None
        } else {
            self.section(kind, requested)
        };
        exact
            .or_else(|| self.default_section(kind))
            .or_else(|| self.sections.iter().find(|s| s.kind == kind))
    }

    /// Insert a custom section.
    pub fn add_section(&mut self, entry: NewSection) -> Result<SectionDefinition, ValidationError> {
        let section = entry.normalize()?;
        if is_reserved(&section.name) || default_sections().iter().any(|d| d.name == section.name) {
            log::debug!("Rejected reserved section name {:?}", section.name);
            return Err(ValidationError::ReservedName(section.name));
        }
        if self.section(section.kind, &section.name).is_some() {
            return Err(ValidationError::Duplicate(format!("{}/{}", section.kind, section.name)));
        }
        self.sections.push(section.clone());
        Ok(section)
    }

    /// Patch a custom section in place. Element re-resolution is the
    /// document's job.
    pub(crate) fn update_section(
        &mut self,
        kind: SectionKind,
        name: &str,
        patch: SectionPatch,
    ) -> Result<SectionDefinition, ValidationError> {
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.kind == kind && s.name == name)
            .ok_or_else(|| ValidationError::NotFound(format!("{kind}/{name}")))?;
        if section.is_default {
            return Err(ValidationError::DefaultEntry(name.to_string()));
        }
        if let SectionKind::Member(_) = kind {
            let current = section.resolved_size();
            section.size = Some(SectionSize::new(
                positive_or(patch.b, current.b),
                positive_or(patch.h, current.h),
            ));
        }
        if let Some(color) = patch.color {
            section.color = color;
        }
        Ok(section.clone())
    }

    /// Drop a custom section. Usage checks happen in the document.
    pub(crate) fn remove_section(&mut self, kind: SectionKind, name: &str) -> Result<(), ValidationError> {
        let idx = self
            .sections
            .iter()
            .position(|s| s.kind == kind && s.name == name)
            .ok_or_else(|| ValidationError::NotFound(format!("{kind}/{name}")))?;
        if self.sections[idx].is_default {
            return Err(ValidationError::DefaultEntry(name.to_string()));
        }
        self.sections.remove(idx);
        Ok(())
    }

    /// Find a member section with exactly these attributes.
    pub fn find_member_section(
        &self,
        kind: MemberKind,
        material: &str,
        size: SectionSize,
        color: Color,
    ) -> Option<&SectionDefinition> {
        let kind = SectionKind::Member(kind);
        self.sections.iter().find(|s| {
            s.kind == kind && s.resolved_material() == material && s.resolved_size() == size && s.color == color
        })
    }

    /// First free `U<n>` name for a kind.
    pub fn next_custom_section_name(&self, kind: SectionKind) -> String {
        (1..)
            .map(|idx| format!("U{idx}"))
            .find(|candidate| {
                self.section(kind, candidate).is_none() && !default_sections().iter().any(|d| &d.name == candidate)
            })
            .unwrap_or_default()
    }

    /// Name of a member section matching the given attributes, creating a
    /// `U<n>` entry when none exists.
    pub(crate) fn find_or_create_member_section(
        &mut self,
        kind: MemberKind,
        material: &str,
        size: SectionSize,
        color: Color,
    ) -> String {
        let material = if material.trim().is_empty() { DEFAULT_MATERIAL } else { material.trim() };
        if let Some(existing) = self.find_member_section(kind, material, size, color) {
            return existing.name.clone();
        }
        let section_kind = SectionKind::Member(kind);
        let name = self.next_custom_section_name(section_kind);
        log::debug!("Creating section {section_kind}/{name} for {material} {}x{}", size.b, size.h);
        self.sections.push(SectionDefinition {
            kind: section_kind,
            name: name.clone(),
            material: material.to_string(),
            size: Some(size),
            color,
            is_default: false,
        });
        name
    }

    pub fn spring(&self, symbol: &str) -> Option<&SpringDefinition> {
        self.springs.iter().find(|s| s.symbol == symbol)
    }

    /// Springs, defaults first and then by symbol.
    pub fn list_springs(&self) -> Vec<&SpringDefinition> {
        let mut list: Vec<_> = self.springs.iter().collect();
        list.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.symbol.cmp(&b.symbol)));
        list
    }

    /// Symbol used when a spring end names nothing valid.
    pub fn fallback_spring(&self) -> Option<&str> {
        self.springs.first().map(|s| s.symbol.as_str())
    }

    pub fn add_spring(&mut self, symbol: &str, memo: &str) -> Result<SpringDefinition, ValidationError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if is_reserved(symbol) || default_springs().iter().any(|d| d.symbol == symbol) {
            return Err(ValidationError::ReservedName(symbol.to_string()));
        }
        if self.spring(symbol).is_some() {
            return Err(ValidationError::Duplicate(symbol.to_string()));
        }
        let spring = SpringDefinition {
            symbol: symbol.to_string(),
            memo: memo.trim().to_string(),
            is_default: false,
        };
        self.springs.push(spring.clone());
        Ok(spring)
    }

    /// Replace the memo of a custom spring.
    pub fn update_spring(&mut self, symbol: &str, memo: &str) -> Result<SpringDefinition, ValidationError> {
        let spring = self
            .springs
            .iter_mut()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| ValidationError::NotFound(symbol.to_string()))?;
        if spring.is_default {
            return Err(ValidationError::DefaultEntry(symbol.to_string()));
        }
        spring.memo = memo.trim().to_string();
        Ok(spring.clone())
    }

    pub(crate) fn remove_spring(&mut self, symbol: &str) -> Result<(), ValidationError> {
        let idx = self
            .springs
            .iter()
            .position(|s| s.symbol == symbol)
            .ok_or_else(|| ValidationError::NotFound(symbol.to_string()))?;
        if self.springs[idx].is_default {
            return Err(ValidationError::DefaultEntry(symbol.to_string()));
        }
        self.springs.remove(idx);
        Ok(())
    }

    /// Make an end-fixity consistent with the spring table: only spring ends
    /// keep a symbol, and an unknown symbol becomes the fallback spring.
    pub fn normalize_end(&self, end: &EndFixity) -> EndFixity {
        match end.condition {
            EndCondition::Spring => {
                let symbol = end
                    .spring_symbol
                    .as_deref()
                    .map(str::trim)
                    .and_then(|s| self.spring(s))
                    .map(|s| s.symbol.as_str())
                    .or_else(|| self.fallback_spring());
                EndFixity {
                    condition: EndCondition::Spring,
                    spring_symbol: symbol.map(str::to_string),
                }
            }
            condition => EndFixity { condition, spring_symbol: None },
        }
    }
}
