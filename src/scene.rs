//! Scene graph: drawable objects, their attributes, and serialization.
//!
//! A [`Scene`] is an ordered list of [`Drawable`]s plus a background fill.
//! Ordering is paint order — later entries render on top. The scene
//! serializes losslessly to a [`Document`], which is both the unit of
//! persistence and the unit of history snapshots. Objects flagged
//! [`Drawable::exclude_from_export`] (tool previews) exist for rendering
//! only and never appear in a serialized document.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::DEFAULT_BACKGROUND;

/// Unique identifier for a drawable object.
pub type ObjectId = Uuid;

/// Shape-specific geometry of a drawable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    /// Freehand stroke through an ordered list of scene points.
    Path { points: Vec<Point> },
    /// Axis-aligned rectangle extending right/down from `left` / `top`.
    Rect { width: f64, height: f64 },
    /// Circle whose bounding box is anchored at `left` / `top`.
    Circle { radius: f64 },
    /// Straight segment from (`left`, `top`) to (`x2`, `y2`).
    Line { x2: f64, y2: f64 },
}

/// Compositing mode used when painting an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Composite {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Pixel-erasing strokes.
    DestinationOut,
}

/// A single shape or stroke entity in the scene.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub id: ObjectId,
    /// Left edge of the bounding box in scene coordinates.
    pub left: f64,
    /// Top edge of the bounding box in scene coordinates.
    pub top: f64,
    pub geometry: Geometry,
    /// Stroke color as a CSS color string.
    pub stroke: String,
    /// Stroke width in scene units.
    pub stroke_width: f64,
    /// Fill color as a CSS color string (`"transparent"` for outlines).
    pub fill: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Whether the object can be picked up by the select tool.
    pub selectable: bool,
    /// Whether the object receives pointer events at all.
    pub evented: bool,
    /// Render the stroke at a uniform screen width regardless of zoom.
    #[serde(default)]
    pub stroke_uniform: bool,
    /// Dash pattern; empty for a solid stroke.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stroke_dash: Vec<f64>,
    #[serde(default)]
    pub composite: Composite,
    /// Transient objects (eraser cursor, in-progress previews) live in the
    /// scene for rendering only; they are filtered from every serialized form.
    #[serde(skip)]
    pub exclude_from_export: bool,
}

fn default_opacity() -> f64 {
    1.0
}

/// Sparse update for a drawable. Only present fields are applied.
///
/// This is the entry path for the select tool's native move/resize: the host
/// reports the surface's manipulation result as a partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialDrawable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    /// New rectangle width; ignored for non-rectangles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// New rectangle height; ignored for non-rectangles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// New circle radius; ignored for non-circles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// New line endpoint x; ignored for non-lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    /// New line endpoint y; ignored for non-lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// Serialized form of a [`Scene`] — the unit of persistence and of history
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub background: String,
    pub objects: Vec<Drawable>,
}

/// The live, ordered collection of drawables for one board.
#[derive(Debug, Clone)]
pub struct Scene {
    background: String,
    objects: Vec<Drawable>,
}

impl Scene {
    /// Create an empty scene with the default background.
    #[must_use]
    pub fn new() -> Self {
        Self { background: DEFAULT_BACKGROUND.to_owned(), objects: Vec::new() }
    }

    /// Background fill color.
    #[must_use]
    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn set_background(&mut self, color: String) {
        self.background = color;
    }

    /// Append an object on top of the paint order.
    pub fn add(&mut self, object: Drawable) {
        self.objects.push(object);
    }

    /// Remove an object by id, returning it if present. The paint order of
    /// the remaining objects is preserved.
    pub fn remove(&mut self, id: &ObjectId) -> Option<Drawable> {
        let index = self.objects.iter().position(|o| o.id == *id)?;
        Some(self.objects.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&Drawable> {
        self.objects.iter().find(|o| o.id == *id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut Drawable> {
        self.objects.iter_mut().find(|o| o.id == *id)
    }

    /// All objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[Drawable] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut Drawable> {
        self.objects.iter_mut()
    }

    /// Apply a partial update to an existing object. Geometry fields that do
    /// not match the object's kind are ignored. Returns false if the object
    /// doesn't exist.
    pub fn apply_partial(&mut self, id: &ObjectId, partial: &PartialDrawable) -> bool {
        let Some(object) = self.get_mut(id) else {
            return false;
        };
        if let Some(left) = partial.left {
            object.left = left;
        }
        if let Some(top) = partial.top {
            object.top = top;
        }
        match &mut object.geometry {
            Geometry::Rect { width, height } => {
                if let Some(w) = partial.width {
                    *width = w;
                }
                if let Some(h) = partial.height {
                    *height = h;
                }
            }
            Geometry::Circle { radius } => {
                if let Some(r) = partial.radius {
                    *radius = r;
                }
            }
            Geometry::Line { x2, y2 } => {
                if let Some(x) = partial.x2 {
                    *x2 = x;
                }
                if let Some(y) = partial.y2 {
                    *y2 = y;
                }
            }
            Geometry::Path { .. } => {}
        }
        if let Some(ref stroke) = partial.stroke {
            object.stroke.clone_from(stroke);
        }
        if let Some(stroke_width) = partial.stroke_width {
            object.stroke_width = stroke_width;
        }
        if let Some(ref fill) = partial.fill {
            object.fill.clone_from(fill);
        }
        if let Some(opacity) = partial.opacity {
            object.opacity = opacity;
        }
        true
    }

    /// Number of objects, transient ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Remove every object. The background is kept.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Snapshot the scene as a document, filtering transient objects.
    #[must_use]
    pub fn to_document(&self) -> Document {
        Document {
            background: self.background.clone(),
            objects: self
                .objects
                .iter()
                .filter(|o| !o.exclude_from_export)
                .cloned()
                .collect(),
        }
    }

    /// Replace the scene contents with a document's.
    pub fn load_document(&mut self, document: Document) {
        self.background = document.background;
        self.objects = document.objects;
    }

    /// Serialize to the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_document())
    }

    /// Deserialize from the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let document: Document = serde_json::from_str(json)?;
        let mut scene = Self::new();
        scene.load_document(document);
        Ok(scene)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
