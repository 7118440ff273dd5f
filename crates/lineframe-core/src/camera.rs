//! Camera module for pan/zoom transforms.

use crate::config::InteractionConfig;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default scale in screen pixels per millimeter (50 px per meter).
pub const DEFAULT_SCALE: f64 = 0.05;

/// Camera manages the plan-view transform.
///
/// `screen = world * scale + offset`. Screen distances are pixels, world
/// distances millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen position of the world origin.
    pub offset: Vec2,
    /// Pixels per millimeter.
    pub scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: DEFAULT_SCALE,
            min_scale: 0.005,
            max_scale: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera using the scale limits of an interaction config.
    pub fn with_config(config: &InteractionConfig) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: config.default_scale.clamp(config.min_scale, config.max_scale),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
        }
    }

    /// World-to-screen transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen-to-world transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// World length covered by `pixels` screen pixels.
    pub fn world_distance(&self, pixels: f64) -> f64 {
        pixels / self.scale
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Place the world origin at the center of a viewport.
    pub fn center_origin(&mut self, viewport: Size) {
        self.offset = Vec2::new(viewport.width / 2.0, viewport.height / 2.0);
    }

    /// Zoom the camera, keeping the world point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        let world_point = self.screen_to_world(screen_point);
        self.scale = new_scale;
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Apply one wheel notch: positive `delta_y` zooms out, anything else in.
    pub fn zoom_wheel(&mut self, screen_point: Point, delta_y: f64, step: f64) {
        let factor = if delta_y > 0.0 { 1.0 / step } else { step };
        self.zoom_at(screen_point, factor);
    }

    /// Reset scale and put the origin at the top-left corner.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = DEFAULT_SCALE.clamp(self.min_scale, self.max_scale);
    }

    /// Fit the camera to show the given world bounds.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            self.center_origin(viewport);
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.scale = scale_x.min(scale_y).clamp(self.min_scale, self.max_scale);

        let bounds_center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - bounds_center.x * self.scale,
            viewport.height / 2.0 - bounds_center.y * self.scale,
        );
    }
}
