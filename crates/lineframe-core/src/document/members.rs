//! Nodes and line elements.

use super::{Document, MEMBER_PREFIX, NODE_PREFIX, ensure_finite, ensure_finite_point, next_id};
use crate::catalog::{Catalog, DEFAULT_MATERIAL, SectionKind};
use crate::color::Color;
use crate::elements::{
    BracePattern, ElementRef, EndFixity, LevelId, Member, MemberId, MemberKind, Node, NodeId,
    SectionSize, positive_or,
};
use crate::error::ValidationError;
use kurbo::{Point, Vec2};

/// Options for a new member. Unset fields take type defaults.
///
/// Raw `material`/`b`/`h` without a `section_name` bind the member to a
/// catalog entry with exactly those attributes, creating one if needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberOptions {
    pub kind: MemberKind,
    pub section_name: Option<String>,
    pub material: Option<String>,
    pub b: Option<f64>,
    pub h: Option<f64>,
    /// Only used to match or create a section from raw attributes.
    pub color: Option<Color>,
    pub level_id: Option<LevelId>,
    pub top_level_id: Option<LevelId>,
    pub brace_pattern: BracePattern,
    pub end_i: EndFixity,
    pub end_j: EndFixity,
}

/// Partial member update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPatch {
    pub kind: Option<MemberKind>,
    pub section_name: Option<String>,
    pub material: Option<String>,
    pub b: Option<f64>,
    pub h: Option<f64>,
    /// Ignored. Member colors always come from the section.
    pub color: Option<Color>,
    pub level_id: Option<LevelId>,
    pub top_level_id: Option<Option<LevelId>>,
    pub brace_pattern: Option<BracePattern>,
    pub end_i: Option<EndFixity>,
    pub end_j: Option<EndFixity>,
}

/// Recompute `section_name`, `section`, `material` and `color` from the
/// catalog. When nothing of the member's type exists, the raw values are
/// kept and only sanitized.
pub(crate) fn apply_member_section(catalog: &Catalog, member: &mut Member) {
    match catalog.resolve_section(SectionKind::Member(member.kind), &member.section_name) {
        Some(section) => {
            member.section_name = section.name.clone();
            member.material = section.resolved_material().to_string();
            member.section = section.resolved_size();
            member.color = section.color;
        }
        None => {
            member.section_name = member.section_name.trim().to_string();
            if member.material.trim().is_empty() {
                member.material = DEFAULT_MATERIAL.to_string();
            }
            member.section = SectionSize::new(
                positive_or(Some(member.section.b), SectionSize::DEFAULT_B),
                positive_or(Some(member.section.h), SectionSize::DEFAULT_H),
            );
        }
    }
}

impl Document {
    // --- Nodes ---

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Add a free node. Members normally get theirs through
    /// [`find_or_create_node`](Self::find_or_create_node).
    pub fn add_node(&mut self, position: Point) -> Result<NodeId, ValidationError> {
        ensure_finite_point(position)?;
        let id = next_id(&mut self.counters.node, NODE_PREFIX);
        self.nodes.push(Node { id: id.clone(), position });
        Ok(id)
    }

    /// Return the node within `tolerance` of `position`, or create one there.
    pub fn find_or_create_node(&mut self, position: Point, tolerance: f64) -> Result<NodeId, ValidationError> {
        ensure_finite_point(position)?;
        match self.find_node_at(position, tolerance) {
            Some(node) => Ok(node.id.clone()),
            None => self.add_node(position),
        }
    }

    pub fn move_node(&mut self, id: &str, position: Point) -> Result<(), ValidationError> {
        ensure_finite_point(position)?;
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        node.position = position;
        Ok(())
    }

    pub fn node_in_use(&self, id: &str) -> bool {
        self.members.iter().any(|m| m.references_node(id))
    }

    /// Remove a node that no member references.
    pub fn remove_node(&mut self, id: &str) -> Result<(), ValidationError> {
        if self.node(id).is_none() {
            return Err(ValidationError::NotFound(id.to_string()));
        }
        if self.node_in_use(id) {
            return Err(ValidationError::InUse(id.to_string()));
        }
        self.nodes.retain(|n| n.id != id);
        Ok(())
    }

    /// Remove those of `candidates` that no member references any more.
    /// Returns the ids actually removed.
    pub fn prune_orphan_nodes(&mut self, candidates: &[NodeId]) -> Vec<NodeId> {
        let orphans: Vec<NodeId> = candidates
            .iter()
            .filter(|id| self.node(id).is_some() && !self.node_in_use(id))
            .cloned()
            .collect();
        self.nodes.retain(|n| !orphans.contains(&n.id));
        orphans
    }

    // --- Members ---

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Add a member between two existing nodes and resolve its section.
    pub fn add_member(
        &mut self,
        start_node: &str,
        end_node: &str,
        options: MemberOptions,
    ) -> Result<MemberId, ValidationError> {
        for id in [start_node, end_node] {
            if self.node(id).is_none() {
                return Err(ValidationError::NotFound(id.to_string()));
            }
        }
        if start_node == end_node {
            return Err(ValidationError::ZeroLength);
        }
        let level_id = self.level_or_active(options.level_id.as_deref())?;
        let top_level_id = match options.top_level_id {
            Some(top) => Some(self.level_or_active(Some(&top))?),
            None if options.kind.is_vertical() => Some(self.default_top_level().to_string()),
            None => None,
        };

        let kind = options.kind;
        let mut section_name = options.section_name.unwrap_or_default().trim().to_string();
        if section_name.is_empty() && (options.b.is_some() || options.h.is_some() || options.material.is_some()) {
            let size = SectionSize::new(
                positive_or(options.b, SectionSize::DEFAULT_B),
                positive_or(options.h, SectionSize::DEFAULT_H),
            );
            let color = options.color.unwrap_or(Color::MEMBER);
            section_name = self.catalog.find_or_create_member_section(
                kind,
                options.material.as_deref().unwrap_or_default(),
                size,
                color,
            );
        }

        let id = next_id(&mut self.counters.member, MEMBER_PREFIX);
        let mut member = Member {
            id: id.clone(),
            kind,
            start_node: start_node.to_string(),
            end_node: end_node.to_string(),
            section_name,
            section: SectionSize::default(),
            material: DEFAULT_MATERIAL.to_string(),
            color: Color::MEMBER,
            level_id,
            top_level_id,
            brace_pattern: options.brace_pattern,
            end_i: self.catalog.normalize_end(&options.end_i),
            end_j: self.catalog.normalize_end(&options.end_j),
        };
        apply_member_section(&self.catalog, &mut member);
        log::debug!("Added {} {id} with section {}", member.kind, member.section_name);
        self.members.push(member);
        Ok(id)
    }

    /// Apply a partial update. A direct color is dropped; type, section,
    /// material or dimension changes re-resolve the member.
    pub fn update_member(&mut self, id: &str, patch: MemberPatch) -> Result<&Member, ValidationError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if let Some(level) = patch.level_id.as_deref() {
            self.level_or_active(Some(level))?;
        }
        if let Some(Some(level)) = &patch.top_level_id {
            self.level_or_active(Some(level.as_str()))?;
        }

        let resolve = patch.kind.is_some()
            || patch.section_name.is_some()
            || patch.material.is_some()
            || patch.b.is_some()
            || patch.h.is_some()
            || patch.color.is_some();
        let raw_spec = patch.section_name.is_none()
            && (patch.material.is_some() || patch.b.is_some() || patch.h.is_some());

        let catalog = &mut self.catalog;
        let member = &mut self.members[idx];
        if let Some(kind) = patch.kind {
            member.kind = kind;
        }
        if let Some(name) = patch.section_name {
            member.section_name = name.trim().to_string();
        }
        if let Some(material) = patch.material {
            member.material = material.trim().to_string();
        }
        if let Some(b) = patch.b {
            member.section.b = b;
        }
        if let Some(h) = patch.h {
            member.section.h = h;
        }
        if let Some(level) = patch.level_id {
            member.level_id = level;
        }
        if let Some(top) = patch.top_level_id {
            member.top_level_id = top;
        }
        if let Some(pattern) = patch.brace_pattern {
            member.brace_pattern = pattern;
        }
        member.end_i = catalog.normalize_end(patch.end_i.as_ref().unwrap_or(&member.end_i));
        member.end_j = catalog.normalize_end(patch.end_j.as_ref().unwrap_or(&member.end_j));

        if raw_spec {
            let size = SectionSize::new(
                positive_or(Some(member.section.b), SectionSize::DEFAULT_B),
                positive_or(Some(member.section.h), SectionSize::DEFAULT_H),
            );
            member.section_name =
                catalog.find_or_create_member_section(member.kind, &member.material, size, member.color);
        }
        if resolve {
            apply_member_section(catalog, member);
        }
        Ok(&self.members[idx])
    }

    /// Remove a member without touching its nodes.
    pub fn detach_member(&mut self, id: &str) -> Result<Member, ValidationError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let member = self.members.remove(idx);
        self.drop_selection_of(&ElementRef::Member(member.id.clone()));
        Ok(member)
    }

    /// Remove a member and any endpoint left without members.
    pub fn remove_member(&mut self, id: &str) -> Result<Member, ValidationError> {
        let member = self.detach_member(id)?;
        let pruned = self.prune_orphan_nodes(&[member.start_node.clone(), member.end_node.clone()]);
        log::debug!("Removed member {id}, pruned {} nodes", pruned.len());
        Ok(member)
    }

    /// Move both endpoints of a member.
    pub fn translate_member(&mut self, id: &str, delta: Vec2) -> Result<(), ValidationError> {
        ensure_finite(&[delta.x, delta.y])?;
        let member = self.member(id).ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let ends = [member.start_node.clone(), member.end_node.clone()];
        for node in self.nodes.iter_mut().filter(|n| ends.contains(&n.id)) {
            node.position += delta;
        }
        Ok(())
    }

    /// Endpoints of a member, if both nodes exist.
    pub fn member_endpoints(&self, member: &Member) -> Option<(Point, Point)> {
        let start = self.node(&member.start_node)?;
        let end = self.node(&member.end_node)?;
        Some((start.position, end.position))
    }
}
