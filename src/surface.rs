//! Rendering capability surface.
//!
//! The engine treats the actual 2D renderer as a black box behind
//! [`RenderSurface`]: a host wraps whatever vector-graphics backend it uses
//! (browser canvas, GPU surface, a test double) and the engine only asks for
//! repaints, cursor changes, free-drawing configuration, and raster export.
//! Everything the engine owns — scene, camera, tool state — stays on this
//! side of the boundary.

#[cfg(test)]
#[path = "surface_test.rs"]
pub(crate) mod surface_test;

use thiserror::Error;

use crate::camera::Camera;
use crate::scene::Scene;

/// Failure modes of the rendering surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The renderer could not produce a raster encoding.
    #[error("raster export failed: {0}")]
    Export(String),
}

/// The black-box vector-graphics engine the editor draws through.
pub trait RenderSurface: Send {
    /// Schedule a repaint of the scene.
    fn request_render(&mut self);

    /// Current viewport size in screen pixels (width, height).
    fn viewport_size(&self) -> (f64, f64);

    /// Set the pointer cursor shown over the surface.
    fn set_cursor(&mut self, cursor: &str);

    /// Configure the surface's native free-drawing (live brush stroke)
    /// rendering. Called on tool and settings changes, and re-applied after
    /// zoom changes while the brush is active.
    fn set_free_drawing(&mut self, enabled: bool, color: &str, width: f64);

    /// Export the scene viewed through `camera` as an encoded raster data
    /// URL at `multiplier` × the viewport scale.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Export`] if the renderer cannot produce the
    /// encoding.
    fn export_data_url(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        multiplier: f64,
    ) -> Result<String, SurfaceError>;
}
