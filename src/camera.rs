#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    MAX_ZOOM, MIN_ZOOM, WHEEL_COARSE_STEP, WHEEL_FINE_RATE, WHEEL_STEP_THRESHOLD, ZOOM_STEP,
};

/// A point in either screen or scene space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Camera state for pan/zoom over the scene.
///
/// `pan_x` / `pan_y` are in screen pixels.
/// `zoom` is a scale factor (1.0 = no zoom), kept within [`MIN_ZOOM`, `MAX_ZOOM`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point to scene coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a scene-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to scene-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Set the zoom factor, clamped to [`MIN_ZOOM`, `MAX_ZOOM`]. The pan
    /// offset is left untouched.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// One discrete zoom-in step ([`ZOOM_STEP`]).
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_STEP);
    }

    /// One discrete zoom-out step.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / ZOOM_STEP);
    }

    /// Restore zoom = 1 and the identity pan offset.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Translate the viewport by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Zoom to `zoom` (clamped) while keeping the scene point under `screen`
    /// stationary on screen.
    pub fn zoom_at_point(&mut self, screen: Point, zoom: f64) {
        let anchor = self.screen_to_world(screen);
        self.set_zoom(zoom);
        self.pan_x = screen.x - anchor.x * self.zoom;
        self.pan_y = screen.y - anchor.y * self.zoom;
    }
}

/// Zoom factor for one wheel event with vertical delta `dy` (positive = down
/// = zoom out).
///
/// Small deltas, typical of trackpads, map to a continuous factor
/// proportional to the delta; large deltas, typical of physical wheel
/// notches, map to a fixed coarse step.
#[must_use]
pub fn wheel_factor(dy: f64) -> f64 {
    if dy.abs() < WHEEL_STEP_THRESHOLD {
        1.0 - dy * WHEEL_FINE_RATE
    } else if dy < 0.0 {
        WHEEL_COARSE_STEP
    } else {
        1.0 / WHEEL_COARSE_STEP
    }
}
