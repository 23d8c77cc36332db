//! Thumbnail capture: fixed-box raster export independent of the live
//! viewport.

#[cfg(test)]
#[path = "thumbnail_test.rs"]
mod thumbnail_test;

use tracing::warn;

use crate::camera::Camera;
use crate::consts::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use crate::scene::Scene;
use crate::surface::RenderSurface;

/// Export the scene as a data-URL raster fitted to the thumbnail target box,
/// preserving aspect ratio.
///
/// The camera is temporarily reset to zoom = 1 with an identity offset so
/// the thumbnail always shows the same framing regardless of where the user
/// has panned or zoomed, then restored exactly. Returns `None` ("skip")
/// instead of failing when a gesture is mid-flight — a capture would persist
/// transient preview state — or when the surface cannot export.
pub fn capture(
    surface: &mut dyn RenderSurface,
    scene: &Scene,
    camera: &mut Camera,
    gesture_active: bool,
) -> Option<String> {
    if gesture_active {
        return None;
    }
    let (width, height) = surface.viewport_size();
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let multiplier = (THUMBNAIL_WIDTH / width).min(THUMBNAIL_HEIGHT / height);

    let saved = *camera;
    *camera = Camera::default();
    let result = surface.export_data_url(scene, camera, multiplier);
    *camera = saved;
    surface.request_render();

    match result {
        Ok(data_url) => Some(data_url),
        Err(e) => {
            warn!(error = %e, "thumbnail export failed");
            None
        }
    }
}
