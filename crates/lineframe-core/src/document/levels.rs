//! Level table management.

use super::{Document, LEVEL_PREFIX, ensure_finite, next_id};
use crate::elements::{Level, LevelId};
use crate::error::ValidationError;

/// Elevations closer than this are considered equal.
const ELEVATION_EPSILON: f64 = 1e-9;

/// Default spacing between consecutive levels, in millimeters.
pub const STOREY_HEIGHT: f64 = 2800.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelPatch {
    pub name: Option<String>,
    pub z: Option<f64>,
}

/// Ids of elements that reference a level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelUsage {
    pub members: Vec<String>,
    pub surfaces: Vec<String>,
    pub loads: Vec<String>,
    pub supports: Vec<String>,
}

impl LevelUsage {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.surfaces.is_empty() && self.loads.is_empty() && self.supports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len() + self.surfaces.len() + self.loads.len() + self.supports.len()
    }
}

impl Document {
    pub fn level(&self, id: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.id == id)
    }

    fn elevation_taken(&self, z: f64, except: Option<&str>) -> bool {
        self.levels
            .iter()
            .filter(|l| Some(l.id.as_str()) != except)
            .any(|l| (l.z - z).abs() < ELEVATION_EPSILON)
    }

    /// Add a level. Elevations must be unique.
    pub fn add_level(&mut self, name: &str, z: f64) -> Result<LevelId, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        ensure_finite(&[z])?;
        if self.elevation_taken(z, None) {
            return Err(ValidationError::DuplicateElevation(z));
        }
        let id = next_id(&mut self.counters.level, LEVEL_PREFIX);
        self.levels.push(Level {
            id: id.clone(),
            name: name.to_string(),
            z,
        });
        log::debug!("Added level {id} {name} at z={z}");
        Ok(id)
    }

    pub fn update_level(&mut self, id: &str, patch: LevelPatch) -> Result<&Level, ValidationError> {
        let idx = self
            .levels
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if let Some(z) = patch.z {
            ensure_finite(&[z])?;
            if self.elevation_taken(z, Some(id)) {
                return Err(ValidationError::DuplicateElevation(z));
            }
        }
        let name = match patch.name.as_deref().map(str::trim) {
            Some("") => return Err(ValidationError::EmptyName),
            other => other.map(str::to_string),
        };
        let level = &mut self.levels[idx];
        if let Some(name) = name {
            level.name = name;
        }
        if let Some(z) = patch.z {
            level.z = z;
        }
        Ok(&self.levels[idx])
    }

    /// Every element referencing the level, as base or top.
    pub fn level_usage(&self, id: &str) -> LevelUsage {
        LevelUsage {
            members: self.members.iter().filter(|m| m.references_level(id)).map(|m| m.id.clone()).collect(),
            surfaces: self.surfaces.iter().filter(|s| s.references_level(id)).map(|s| s.id.clone()).collect(),
            loads: self.loads.iter().filter(|l| l.level_id == id).map(|l| l.id.clone()).collect(),
            supports: self.supports.iter().filter(|s| s.level_id == id).map(|s| s.id.clone()).collect(),
        }
    }

    /// Remove an unreferenced level. The last level cannot be removed.
    pub fn remove_level(&mut self, id: &str) -> Result<Level, ValidationError> {
        let idx = self
            .levels
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if self.levels.len() <= 1 {
            return Err(ValidationError::LastLevel);
        }
        let usage = self.level_usage(id);
        if !usage.is_empty() {
            log::debug!("Level {id} is referenced by {} elements", usage.len());
            return Err(ValidationError::InUse(id.to_string()));
        }
        let level = self.levels.remove(idx);
        if self.active_level() == id {
            let first = self.levels.first().map(|l| l.id.clone()).unwrap_or_default();
            self.set_active_level(&first)?;
        }
        if self.default_top_level() == id {
            let last = self.levels.last().map(|l| l.id.clone()).unwrap_or_default();
            self.set_default_top_level(&last)?;
        }
        Ok(level)
    }

    /// Suggested elevation for a new level: one storey above the highest,
    /// nudged upward until free.
    pub fn next_level_elevation(&self) -> f64 {
        let top = self.levels.iter().map(|l| l.z).fold(f64::NEG_INFINITY, f64::max);
        let mut z = if top.is_finite() { top + STOREY_HEIGHT } else { 0.0 };
        while self.elevation_taken(z, None) {
            z += 100.0;
        }
        z
    }

    /// Levels ordered by elevation.
    pub fn levels_by_elevation(&self) -> Vec<&Level> {
        let mut levels: Vec<&Level> = self.levels.iter().collect();
        levels.sort_by(|a, b| a.z.total_cmp(&b.z));
        levels
    }
}
