//! The drafting session: one document, its history, the camera and the
//! active tool, driven by pointer and keyboard events.
//!
//! The session is the only writer of the document during interaction.
//! Event handlers return `true` when the view needs a redraw.

use crate::camera::Camera;
use crate::config::InteractionConfig;
use crate::document::{Document, MemberOptions, SupportOptions, SurfaceOptions};
use crate::elements::{ElementRef, LoadKind, NodeId, PointForces};
use crate::error::{FormatResult, ValidationError};
use crate::history::History;
use crate::input::{InputState, KeyAction, KeyEvent, Modifiers, MouseButton, PointerEvent, keys};
use crate::snap::{SnapOptions, SnapResult, snap_position};
use crate::tools::{Placement, Preview, ToolKind, ToolManager};
use kurbo::{Point, Vec2};

/// Attributes applied to newly placed elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftDefaults {
    pub member: MemberOptions,
    pub surface: SurfaceOptions,
    /// Intensity of new area and line loads.
    pub load_value: f64,
    pub point_forces: PointForces,
    pub support: SupportOptions,
}

#[derive(Debug, Clone, PartialEq)]
enum DragTarget {
    /// Endpoint of the selected member.
    Node(NodeId),
    /// Whole element, keeping the grab point's offset from its anchor.
    Element { element: ElementRef, grab_offset: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
struct DragState {
    target: DragTarget,
    /// Screen position of the press.
    origin: Point,
    /// Set once the pointer travelled past the drag threshold.
    active: bool,
}

/// An interactive editing session.
#[derive(Debug, Clone)]
pub struct Session {
    pub document: Document,
    pub history: History,
    pub camera: Camera,
    pub config: InteractionConfig,
    pub drafts: DraftDefaults,
    tools: ToolManager,
    input: InputState,
    drag: Option<DragState>,
    /// Last screen position while panning.
    pan_anchor: Option<Point>,
    notice: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_document(Document::new(), InteractionConfig::default())
    }

    pub fn with_document(document: Document, config: InteractionConfig) -> Self {
        Self {
            document,
            history: History::with_capacity(config.history_capacity),
            camera: Camera::with_config(&config),
            config,
            drafts: DraftDefaults::default(),
            tools: ToolManager::new(),
            input: InputState::new(),
            drag: None,
            pan_anchor: None,
            notice: None,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool()
    }

    /// Switch tools. Any in-progress placement or drag is dropped without
    /// touching the document.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        let changed = self.tools.set_tool(tool);
        if changed {
            self.drag = None;
        }
        changed
    }

    /// Live geometry of the current placement.
    pub fn preview(&self) -> Option<Preview> {
        self.tools.preview()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(|d| d.active)
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Message describing the last rejected edit.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// World position of the pointer.
    pub fn cursor_world(&self) -> Point {
        self.camera.screen_to_world(self.input.pointer_position)
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.input.set_modifiers(modifiers);
    }

    /// Run a document edit as one undoable step. The pre-edit snapshot is
    /// recorded only if the edit succeeds; a failed edit leaves the document
    /// as it was and sets the notice.
    pub fn apply<T>(
        &mut self,
        edit: impl FnOnce(&mut Document) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let before = self.document.snapshot();
        match edit(&mut self.document) {
            Ok(value) => {
                self.history.record(before);
                self.notice = None;
                Ok(value)
            }
            Err(err) => {
                self.document.restore(before);
                log::warn!("Edit rejected: {err}");
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Replace the document with a parsed file. History and any
    /// in-progress interaction are dropped; a failed load changes nothing.
    pub fn open_json(&mut self, text: &str) -> FormatResult<()> {
        self.document.load_json(text)?;
        self.history.clear();
        self.tools.cancel();
        self.drag = None;
        self.notice = None;
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.drag = None;
        self.history.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> bool {
        self.drag = None;
        self.history.redo(&mut self.document)
    }

    // --- Pointer ---

    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        self.input.handle_pointer_event(&event);
        match event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { .. } => self.pointer_up(),
            PointerEvent::Scroll { position, delta } => {
                self.camera.zoom_wheel(position, delta.y, self.config.zoom_step);
                true
            }
        }
    }

    fn pointer_down(&mut self, screen: Point, button: MouseButton) -> bool {
        let space_held = self.input.is_key_pressed(keys::SPACE);
        if button == MouseButton::Middle || (button == MouseButton::Left && space_held) {
            self.pan_anchor = Some(screen);
            return false;
        }
        if button != MouseButton::Left {
            return false;
        }
        match self.tools.current_tool() {
            ToolKind::Select => self.select_down(screen),
            _ => self.place_down(screen),
        }
    }

    fn pointer_move(&mut self, screen: Point) -> bool {
        if let Some(anchor) = self.pan_anchor {
            self.camera.pan(screen - anchor);
            self.pan_anchor = Some(screen);
            return true;
        }
        match self.tools.current_tool() {
            ToolKind::Select => self.select_move(screen),
            _ => {
                if !self.tools.is_active() {
                    return false;
                }
                let snapped = self.snap_placement(screen);
                self.tools.update(snapped.point);
                true
            }
        }
    }

    fn pointer_up(&mut self) -> bool {
        if self.pan_anchor.take().is_some() {
            return false;
        }
        self.drag = None;
        false
    }

    // --- Select tool ---

    fn pick_tolerance(&self) -> f64 {
        self.camera.world_distance(self.config.pick_radius(&self.document.settings))
    }

    fn select_down(&mut self, screen: Point) -> bool {
        let world = self.camera.screen_to_world(screen);
        let tolerance = self.pick_tolerance();

        // Endpoints first, so a member can be stretched by its node.
        let node_hit = self.document.find_node_at(world, tolerance).and_then(|node| {
            self.document
                .members()
                .iter()
                .find(|m| m.references_node(&node.id))
                .map(|m| (node.id.clone(), m.id.clone()))
        });
        if let Some((node_id, member_id)) = node_hit {
            return self.begin_drag(ElementRef::Member(member_id), DragTarget::Node(node_id), screen);
        }

        if let Some(element) = self.document.find_element_at(world, tolerance) {
            let Some(anchor) = self.document.element_anchor(&element) else {
                return false;
            };
            let target = DragTarget::Element {
                element: element.clone(),
                grab_offset: anchor - world,
            };
            return self.begin_drag(element, target, screen);
        }

        self.document.clear_selection();
        self.drag = None;
        true
    }

    fn begin_drag(&mut self, selected: ElementRef, target: DragTarget, origin: Point) -> bool {
        if let Err(err) = self.document.select(selected) {
            log::warn!("Cannot select: {err}");
            return false;
        }
        self.drag = Some(DragState {
            target,
            origin,
            active: false,
        });
        true
    }

    fn select_move(&mut self, screen: Point) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        if !drag.active {
            if (screen - drag.origin).hypot() <= self.config.drag_threshold_px {
                return false;
            }
            drag.active = true;
            self.history.save(&self.document);
        }
        let target = drag.target.clone();

        let world = self.camera.screen_to_world(screen);
        let exclude = match &target {
            DragTarget::Node(id) => Some(id.as_str()),
            DragTarget::Element { .. } => None,
        };
        let options = SnapOptions {
            exclude_node: exclude,
            ..self.snap_options()
        };
        let snapped = snap_position(&self.document, &self.camera, world, options);

        let result = match &target {
            DragTarget::Node(id) => self.document.move_node(id, snapped.point),
            DragTarget::Element { element, grab_offset } => match self.document.element_anchor(element) {
                Some(current) => {
                    let delta = (snapped.point + *grab_offset) - current;
                    self.document.translate_element(element, delta)
                }
                None => Err(ValidationError::NotFound(format!("{element:?}"))),
            },
        };
        if let Err(err) = result {
            log::warn!("Drag target vanished: {err}");
            self.drag = None;
        }
        true
    }

    // --- Placement tools ---

    fn snap_options(&self) -> SnapOptions<'static> {
        SnapOptions {
            node_radius_px: self.config.node_snap_radius_px,
            angle_step: self.config.angle_step_degrees,
            ..SnapOptions::default()
        }
    }

    fn snap_placement(&self, screen: Point) -> SnapResult {
        let world = self.camera.screen_to_world(screen);
        let options = SnapOptions {
            anchor: self.tools.anchor(),
            constrain_angle: self.input.modifiers.shift,
            ..self.snap_options()
        };
        snap_position(&self.document, &self.camera, world, options)
    }

    fn place_down(&mut self, screen: Point) -> bool {
        let snapped = self.snap_placement(screen);
        let close_tolerance = self.camera.world_distance(self.config.node_snap_radius_px);
        if let Some(placement) = self.tools.click(snapped.point, close_tolerance) {
            self.commit(placement);
        }
        true
    }

    /// Add a finished placement to the document as one undoable step.
    /// A rejected placement is dropped and reported through the notice.
    fn commit(&mut self, placement: Placement) {
        let merge = self.config.node_merge_tolerance;
        let drafts = self.drafts.clone();
        let result = self.apply(move |doc| {
            match placement {
                Placement::Member { start, end } => {
                    let a = doc.find_or_create_node(start, merge)?;
                    let b = doc.find_or_create_node(end, merge)?;
                    doc.add_member(&a, &b, drafts.member)?;
                }
                Placement::Surface(geometry) => {
                    doc.add_surface(geometry, drafts.surface)?;
                }
                Placement::AreaLoad(rect) => {
                    let kind = LoadKind::Area {
                        rect,
                        value: drafts.load_value,
                    };
                    doc.add_load(kind, None)?;
                }
                Placement::LineLoad { start, end } => {
                    let kind = LoadKind::Line {
                        start,
                        end,
                        value: drafts.load_value,
                    };
                    doc.add_load(kind, None)?;
                }
                Placement::PointLoad(at) => {
                    let kind = LoadKind::Point {
                        at,
                        forces: drafts.point_forces,
                    };
                    doc.add_load(kind, None)?;
                }
                Placement::Support(position) => {
                    doc.add_support(position, drafts.support)?;
                }
            }
            Ok(())
        });
        if let Err(err) = result {
            log::debug!("Discarded placement: {err}");
        }
    }

    // --- Keyboard ---

    /// Dispatch a key through [`crate::input::KEY_BINDINGS`].
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        self.input.handle_key_event(&event);
        let KeyEvent::Pressed(key) = event else {
            return false;
        };
        let Some(action) = KeyAction::lookup(&key, self.input.modifiers) else {
            return false;
        };

        match action {
            KeyAction::Undo => self.undo(),
            KeyAction::Redo => self.redo(),
            KeyAction::Cancel => {
                if self.tools.cancel() {
                    return true;
                }
                self.drag = None;
                let had_selection = self.document.selection().is_some();
                self.document.clear_selection();
                had_selection
            }
            KeyAction::DeleteSelection => {
                let Some(selected) = self.document.selection().cloned() else {
                    return false;
                };
                self.drag = None;
                self.apply(|doc| doc.remove_element(&selected)).is_ok()
            }
            KeyAction::ClosePolygon => match self.tools.confirm() {
                // The staged outline is gone either way, so redraw.
                Some(placement) => {
                    self.commit(placement);
                    true
                }
                None => false,
            },
        }
    }
}
