//! Document settings and session tuning.

use serde::{Deserialize, Serialize};

/// Per-document drafting settings, persisted in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Grid spacing in millimeters.
    pub grid_size: f64,
    /// Whether node and grid snapping is active.
    pub snap: bool,
    /// Display thickness offset for walls, in millimeters.
    pub wall_display_offset: f64,
    pub show_supports: bool,
    /// Enlarge the pick radius for hit-testing.
    pub wide_pick: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_size: 1000.0,
            snap: true,
            wall_display_offset: 120.0,
            show_supports: true,
            wide_pick: false,
        }
    }
}

impl Settings {
    /// Grid spacing, ignoring non-positive values.
    pub fn effective_grid_size(&self) -> f64 {
        if self.grid_size.is_finite() && self.grid_size > 0.0 {
            self.grid_size
        } else {
            Settings::default().grid_size
        }
    }

    /// Wall offset, falling back to the default when unset.
    pub fn effective_wall_offset(&self) -> f64 {
        if self.wall_display_offset.is_finite() && self.wall_display_offset != 0.0 {
            self.wall_display_offset
        } else {
            Settings::default().wall_display_offset
        }
    }
}

/// Interaction tuning for a drafting session. Screen distances are in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// Pointer travel before a press in select mode becomes a drag.
    pub drag_threshold_px: f64,
    /// Hit-test radius for selection.
    pub pick_radius_px: f64,
    /// Radius within which the cursor snaps onto an existing node.
    pub node_snap_radius_px: f64,
    /// World distance under which two placed endpoints share a node.
    pub node_merge_tolerance: f64,
    /// Angle increment for the Shift constraint, in degrees.
    pub angle_step_degrees: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Initial pixels per millimeter.
    pub default_scale: f64,
    /// Zoom factor applied per wheel notch.
    pub zoom_step: f64,
    /// Maximum number of undo snapshots kept.
    pub history_capacity: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 3.0,
            pick_radius_px: 8.0,
            node_snap_radius_px: 10.0,
            node_merge_tolerance: 0.01,
            angle_step_degrees: 45.0,
            min_scale: 0.005,
            max_scale: 1.0,
            default_scale: 0.05,
            zoom_step: 1.1,
            history_capacity: 50,
        }
    }
}

impl InteractionConfig {
    /// Pick radius in screen pixels, doubled when `wide_pick` is set.
    pub fn pick_radius(&self, settings: &Settings) -> f64 {
        if settings.wide_pick {
            self.pick_radius_px * 2.0
        } else {
            self.pick_radius_px
        }
    }
}
