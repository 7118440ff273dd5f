//! Planar elements, loads and supports.

use super::{Document, LOAD_PREFIX, SUPPORT_PREFIX, SURFACE_PREFIX, ensure_finite, ensure_finite_point, next_id};
use crate::catalog::{Catalog, SectionKind};
use crate::color::Color;
use crate::elements::{
    ElementRef, LevelId, Load, LoadId, LoadKind, LoadDirection, Restraints, Support, SupportId,
    Surface, SurfaceGeometry, SurfaceId, SurfaceKind,
};
use crate::error::ValidationError;
use kurbo::{Point, Vec2};

/// Geometry below this size is treated as degenerate.
const MIN_EXTENT: f64 = 0.01;

/// Options for a new surface. The type defaults to floor for rectangles and
/// wall for lines and polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceOptions {
    pub kind: Option<SurfaceKind>,
    pub section_name: Option<String>,
    pub level_id: Option<LevelId>,
    pub top_level_id: Option<LevelId>,
    pub load_direction: LoadDirection,
    /// Used only when no section of the type exists.
    pub color: Option<Color>,
}

/// Partial surface update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfacePatch {
    pub kind: Option<SurfaceKind>,
    pub section_name: Option<String>,
    /// Ignored. Surface colors always come from the section.
    pub color: Option<Color>,
    pub level_id: Option<LevelId>,
    pub top_level_id: Option<LevelId>,
    pub load_direction: Option<LoadDirection>,
    pub geometry: Option<SurfaceGeometry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadPatch {
    pub kind: Option<LoadKind>,
    pub level_id: Option<LevelId>,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportOptions {
    pub level_id: Option<LevelId>,
    pub restraints: Restraints,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportPatch {
    pub position: Option<Point>,
    pub level_id: Option<LevelId>,
    pub restraints: Option<Restraints>,
}

/// Recompute `section_name` and `color` from the catalog.
pub(crate) fn apply_surface_section(catalog: &Catalog, surface: &mut Surface) {
    match catalog.resolve_section(SectionKind::Surface(surface.kind), &surface.section_name) {
        Some(section) => {
            surface.section_name = section.name.clone();
            surface.color = section.color;
        }
        None => surface.section_name = surface.section_name.trim().to_string(),
    }
}

fn validate_geometry(geometry: &SurfaceGeometry) -> Result<(), ValidationError> {
    match geometry {
        SurfaceGeometry::Rect(rect) => ensure_finite(&[rect.x0, rect.y0, rect.x1, rect.y1])?,
        SurfaceGeometry::Line { start, end } => {
            ensure_finite_point(*start)?;
            ensure_finite_point(*end)?;
        }
        SurfaceGeometry::Polygon(points) => points.iter().try_for_each(|p| ensure_finite_point(*p))?,
    }
    match geometry {
        SurfaceGeometry::Rect(rect) => {
            if rect.width().abs() < MIN_EXTENT || rect.height().abs() < MIN_EXTENT {
                return Err(ValidationError::ZeroLength);
            }
        }
        SurfaceGeometry::Line { start, end } => {
            if start.distance(*end) < MIN_EXTENT {
                return Err(ValidationError::ZeroLength);
            }
        }
        SurfaceGeometry::Polygon(points) => {
            if points.len() < 3 {
                return Err(ValidationError::TooFewVertices(points.len()));
            }
        }
    }
    Ok(())
}

fn normalize_load(kind: LoadKind) -> Result<LoadKind, ValidationError> {
    match &kind {
        LoadKind::Area { rect, value } => ensure_finite(&[rect.x0, rect.y0, rect.x1, rect.y1, *value])?,
        LoadKind::Line { start, end, value } => ensure_finite(&[start.x, start.y, end.x, end.y, *value])?,
        LoadKind::Point { at, forces } => ensure_finite(&[
            at.x, at.y, forces.fx, forces.fy, forces.fz, forces.mx, forces.my, forces.mz,
        ])?,
    }
    match kind {
        LoadKind::Area { rect, value } => {
            let rect = rect.abs();
            if rect.width() < MIN_EXTENT || rect.height() < MIN_EXTENT {
                return Err(ValidationError::ZeroLength);
            }
            Ok(LoadKind::Area { rect, value })
        }
        LoadKind::Line { start, end, .. } if start.distance(end) < MIN_EXTENT => Err(ValidationError::ZeroLength),
        other => Ok(other),
    }
}

impl Document {
    // --- Surfaces ---

    pub fn surface(&self, id: &str) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    /// Add a surface and resolve its section.
    pub fn add_surface(
        &mut self,
        geometry: SurfaceGeometry,
        options: SurfaceOptions,
    ) -> Result<SurfaceId, ValidationError> {
        validate_geometry(&geometry)?;
        let level_id = self.level_or_active(options.level_id.as_deref())?;
        let top_level_id = match options.top_level_id {
            Some(top) => self.level_or_active(Some(&top))?,
            None => self.default_top_level().to_string(),
        };
        let kind = options.kind.unwrap_or(match geometry {
            SurfaceGeometry::Rect(_) => SurfaceKind::Floor,
            _ => SurfaceKind::Wall,
        });
        let geometry = match geometry {
            SurfaceGeometry::Rect(rect) => SurfaceGeometry::Rect(rect.abs()),
            other => other,
        };

        let id = next_id(&mut self.counters.surface, SURFACE_PREFIX);
        let mut surface = Surface {
            id: id.clone(),
            kind,
            section_name: options.section_name.unwrap_or_default(),
            color: options.color.unwrap_or_else(|| kind.default_color()),
            level_id,
            top_level_id,
            load_direction: options.load_direction,
            geometry,
        };
        apply_surface_section(&self.catalog, &mut surface);
        log::debug!("Added {} {id} ({:?})", surface.kind, surface.shape());
        self.surfaces.push(surface);
        Ok(id)
    }

    /// Apply a partial update. A direct color is dropped.
    pub fn update_surface(&mut self, id: &str, patch: SurfacePatch) -> Result<&Surface, ValidationError> {
        let idx = self
            .surfaces
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if let Some(level) = &patch.level_id {
            self.level_or_active(Some(level.as_str()))?;
        }
        if let Some(level) = &patch.top_level_id {
            self.level_or_active(Some(level.as_str()))?;
        }
        if let Some(geometry) = &patch.geometry {
            validate_geometry(geometry)?;
        }

        let resolve = patch.kind.is_some() || patch.section_name.is_some() || patch.color.is_some();
        let surface = &mut self.surfaces[idx];
        if let Some(kind) = patch.kind {
            surface.kind = kind;
        }
        if let Some(name) = patch.section_name {
            surface.section_name = name;
        }
        if let Some(level) = patch.level_id {
            surface.level_id = level;
        }
        if let Some(top) = patch.top_level_id {
            surface.top_level_id = top;
        }
        if let Some(direction) = patch.load_direction {
            surface.load_direction = direction;
        }
        if let Some(geometry) = patch.geometry {
            surface.geometry = geometry;
        }
        if resolve {
            apply_surface_section(&self.catalog, surface);
        }
        Ok(&self.surfaces[idx])
    }

    pub fn remove_surface(&mut self, id: &str) -> Result<Surface, ValidationError> {
        let idx = self
            .surfaces
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let surface = self.surfaces.remove(idx);
        self.drop_selection_of(&ElementRef::Surface(surface.id.clone()));
        Ok(surface)
    }

    pub fn translate_surface(&mut self, id: &str, delta: Vec2) -> Result<(), ValidationError> {
        ensure_finite(&[delta.x, delta.y])?;
        let surface = self
            .surfaces
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        surface.geometry.translate(delta);
        Ok(())
    }

    // --- Loads ---

    pub fn load(&self, id: &str) -> Option<&Load> {
        self.loads.iter().find(|l| l.id == id)
    }

    /// Add a load on `level_id` (or the active level) in its type's default color.
    pub fn add_load(&mut self, kind: LoadKind, level_id: Option<&str>) -> Result<LoadId, ValidationError> {
        let kind = normalize_load(kind)?;
        let level_id = self.level_or_active(level_id)?;
        let id = next_id(&mut self.counters.load, LOAD_PREFIX);
        let load = Load {
            id: id.clone(),
            level_id,
            color: kind.load_type().default_color(),
            kind,
        };
        log::debug!("Added {:?} {id}", load.load_type());
        self.loads.push(load);
        Ok(id)
    }

    pub fn update_load(&mut self, id: &str, patch: LoadPatch) -> Result<&Load, ValidationError> {
        let idx = self
            .loads
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if let Some(level) = &patch.level_id {
            self.level_or_active(Some(level.as_str()))?;
        }
        let kind = patch.kind.map(normalize_load).transpose()?;
        let load = &mut self.loads[idx];
        if let Some(kind) = kind {
            load.kind = kind;
        }
        if let Some(level) = patch.level_id {
            load.level_id = level;
        }
        if let Some(color) = patch.color {
            load.color = color;
        }
        Ok(&self.loads[idx])
    }

    pub fn remove_load(&mut self, id: &str) -> Result<Load, ValidationError> {
        let idx = self
            .loads
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let load = self.loads.remove(idx);
        self.drop_selection_of(&ElementRef::Load(load.id.clone()));
        Ok(load)
    }

    pub fn translate_load(&mut self, id: &str, delta: Vec2) -> Result<(), ValidationError> {
        ensure_finite(&[delta.x, delta.y])?;
        let load = self
            .loads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        load.kind.translate(delta);
        Ok(())
    }

    // --- Supports ---

    pub fn support(&self, id: &str) -> Option<&Support> {
        self.supports.iter().find(|s| s.id == id)
    }

    pub fn add_support(&mut self, position: Point, options: SupportOptions) -> Result<SupportId, ValidationError> {
        ensure_finite_point(position)?;
        let level_id = self.level_or_active(options.level_id.as_deref())?;
        let id = next_id(&mut self.counters.support, SUPPORT_PREFIX);
        self.supports.push(Support {
            id: id.clone(),
            position,
            level_id,
            restraints: options.restraints,
        });
        Ok(id)
    }

    pub fn update_support(&mut self, id: &str, patch: SupportPatch) -> Result<&Support, ValidationError> {
        let idx = self
            .supports
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if let Some(level) = &patch.level_id {
            self.level_or_active(Some(level.as_str()))?;
        }
        if let Some(position) = patch.position {
            ensure_finite_point(position)?;
        }
        let support = &mut self.supports[idx];
        if let Some(position) = patch.position {
            support.position = position;
        }
        if let Some(level) = patch.level_id {
            support.level_id = level;
        }
        if let Some(restraints) = patch.restraints {
            support.restraints = restraints;
        }
        Ok(&self.supports[idx])
    }

    pub fn remove_support(&mut self, id: &str) -> Result<Support, ValidationError> {
        let idx = self
            .supports
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let support = self.supports.remove(idx);
        self.drop_selection_of(&ElementRef::Support(support.id.clone()));
        Ok(support)
    }

    pub fn translate_support(&mut self, id: &str, delta: Vec2) -> Result<(), ValidationError> {
        ensure_finite(&[delta.x, delta.y])?;
        let support = self
            .supports
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        support.position += delta;
        Ok(())
    }

    /// Remove whichever element `element` names.
    pub fn remove_element(&mut self, element: &ElementRef) -> Result<(), ValidationError> {
        match element {
            ElementRef::Member(id) => self.remove_member(id).map(drop),
            ElementRef::Surface(id) => self.remove_surface(id).map(drop),
            ElementRef::Load(id) => self.remove_load(id).map(drop),
            ElementRef::Support(id) => self.remove_support(id).map(drop),
        }
    }

    /// Reference point of an element, used as the grab point when dragging.
    pub fn element_anchor(&self, element: &ElementRef) -> Option<Point> {
        match element {
            ElementRef::Member(id) => {
                let member = self.member(id)?;
                self.member_endpoints(member).map(|(start, _)| start)
            }
            ElementRef::Surface(id) => self.surface(id).map(|s| s.geometry.anchor()),
            ElementRef::Load(id) => self.load(id).map(|l| l.kind.anchor()),
            ElementRef::Support(id) => self.support(id).map(|s| s.position),
        }
    }

    /// Move whichever element `element` names.
    pub fn translate_element(&mut self, element: &ElementRef, delta: Vec2) -> Result<(), ValidationError> {
        match element {
            ElementRef::Member(id) => self.translate_member(id, delta),
            ElementRef::Surface(id) => self.translate_surface(id, delta),
            ElementRef::Load(id) => self.translate_load(id, delta),
            ElementRef::Support(id) => self.translate_support(id, delta),
        }
    }
}
