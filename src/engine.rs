//! The canvas engine: owns the scene, camera, settings and the active tool
//! handler; routes pointer input and reports scene mutations to the host.
//!
//! The engine deliberately knows nothing about history, autosave or the
//! network. Input handlers return [`Action`]s; the engine resolves the
//! visual ones (render requests, cursor changes) against the surface and
//! hands the scene-mutating ones back to the session layer.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::debug;

use crate::camera::{self, Camera, Point};
use crate::input::{Tool, ToolSettings, UiState, WheelDelta};
use crate::scene::{Document, ObjectId, PartialDrawable, Scene};
use crate::surface::RenderSurface;
use crate::thumbnail;
use crate::tools::{self, ToolCtx, ToolHandler};

/// Scene-affecting outcomes of an input event, processed by the host
/// (history capture, autosave scheduling, deferred tool switches).
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A finalized object entered the scene.
    ObjectAdded(ObjectId),
    /// An existing object's attributes changed.
    ObjectModified(ObjectId),
    /// Objects were permanently removed.
    ObjectsRemoved(Vec<ObjectId>),
    /// A brush stroke was committed as a Path object.
    StrokeCompleted(ObjectId),
    /// The tool asks the session to switch tools on the next tick.
    SwitchTool(Tool),
    /// The surface cursor should change.
    SetCursor(&'static str),
    /// The scene or viewport changed visually.
    RenderNeeded,
}

impl Action {
    /// Whether this action mutates the persisted scene.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::ObjectAdded(_)
                | Self::ObjectModified(_)
                | Self::ObjectsRemoved(_)
                | Self::StrokeCompleted(_)
        )
    }
}

/// The live editing engine for one board.
pub struct Engine {
    scene: Scene,
    camera: Camera,
    settings: ToolSettings,
    ui: UiState,
    handler: Box<dyn ToolHandler>,
    surface: Box<dyn RenderSurface>,
}

impl Engine {
    #[must_use]
    pub fn new(surface: Box<dyn RenderSurface>) -> Self {
        let mut ui = UiState::default();
        ui.apply_tool_flags(Tool::Select);
        let mut engine = Self {
            scene: Scene::new(),
            camera: Camera::default(),
            settings: ToolSettings::default(),
            ui,
            handler: tools::handler_for(Tool::Select),
            surface,
        };
        engine.sync_free_drawing();
        engine.surface.set_cursor(Tool::Select.cursor());
        engine
    }

    // --- Tool state machine ---

    /// Switch the active tool.
    ///
    /// Always runs the full teardown protocol, in order: previous handler
    /// exit (ends gestures, removes transient objects), opacity restore for
    /// any deletion previews left behind, global interaction flag update,
    /// per-object interactivity recompute, then the new handler's enter
    /// hook. No switch can leak pointer handling from the previous tool —
    /// the old handler object is dropped wholesale.
    pub fn set_tool(&mut self, tool: Tool) {
        let leftover = self.dispatch(|handler, ctx| handler.on_exit(ctx));
        if !leftover.is_empty() {
            debug!(count = leftover.len(), "discarding actions from tool exit");
        }
        for object in self.scene.objects_mut() {
            if !object.exclude_from_export && (object.opacity - 1.0).abs() > f64::EPSILON {
                object.opacity = 1.0;
            }
        }
        self.ui.apply_tool_flags(tool);
        let interactive = tool == Tool::Select;
        for object in self.scene.objects_mut() {
            if object.exclude_from_export {
                continue;
            }
            object.selectable = interactive;
            object.evented = interactive;
        }
        self.handler = tools::handler_for(tool);
        let leftover = self.dispatch(|handler, ctx| handler.on_enter(ctx));
        if !leftover.is_empty() {
            debug!(count = leftover.len(), "discarding actions from tool enter");
        }
        self.sync_free_drawing();
        self.surface.set_cursor(tool.cursor());
        self.surface.request_render();
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    // --- Pointer input ---

    pub fn pointer_down(&mut self, screen: Point) -> Vec<Action> {
        self.dispatch(|handler, ctx| handler.on_pointer_down(ctx, screen))
    }

    pub fn pointer_move(&mut self, screen: Point) -> Vec<Action> {
        self.dispatch(|handler, ctx| handler.on_pointer_move(ctx, screen))
    }

    pub fn pointer_up(&mut self, screen: Point) -> Vec<Action> {
        self.dispatch(|handler, ctx| handler.on_pointer_up(ctx, screen))
    }

    /// Run a handler hook against a borrowed view of the engine state, then
    /// resolve visual actions against the surface. Scene-mutating actions
    /// are returned for the session to process.
    fn dispatch<F>(&mut self, hook: F) -> Vec<Action>
    where
        F: FnOnce(&mut dyn ToolHandler, &mut ToolCtx<'_>) -> Vec<Action>,
    {
        let Self { scene, camera, settings, ui, handler, surface } = self;
        let mut ctx = ToolCtx { scene, camera, settings: &*settings, ui };
        let actions = hook(handler.as_mut(), &mut ctx);
        let mut out = Vec::new();
        let mut render = false;
        for action in actions {
            match action {
                Action::RenderNeeded => render = true,
                Action::SetCursor(cursor) => surface.set_cursor(cursor),
                other => out.push(other),
            }
        }
        if render {
            surface.request_render();
        }
        out
    }

    // --- Viewport ---

    /// Wheel-driven zoom anchored at the cursor.
    pub fn wheel(&mut self, screen: Point, delta: WheelDelta) {
        let factor = camera::wheel_factor(delta.dy);
        let target = self.camera.zoom * factor;
        self.camera.zoom_at_point(screen, target);
        self.after_zoom_change();
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
        self.after_zoom_change();
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
        self.after_zoom_change();
    }

    pub fn reset_zoom(&mut self) {
        self.camera.reset();
        self.after_zoom_change();
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.camera.zoom
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    fn after_zoom_change(&mut self) {
        // The surface scales its live brush preview with the viewport;
        // re-assert the configured width so strokes keep their screen size.
        if self.ui.free_drawing {
            self.sync_free_drawing();
        }
        self.surface.request_render();
    }

    // --- Settings ---

    pub fn set_stroke_color(&mut self, color: String) {
        self.settings.stroke_color = color;
        self.sync_free_drawing();
    }

    pub fn set_brush_width(&mut self, width: f64) {
        self.settings.brush_width = width;
        self.sync_free_drawing();
    }

    #[must_use]
    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    fn sync_free_drawing(&mut self) {
        self.surface.set_free_drawing(
            self.ui.free_drawing,
            &self.settings.stroke_color,
            self.settings.brush_width,
        );
    }

    // --- Scene access ---

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The currently selected object, if any.
    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.ui.selected_id
    }

    /// Set the selection from the surface's native manipulation. Ignored
    /// outside select mode.
    pub fn set_selection(&mut self, id: Option<ObjectId>) {
        if self.ui.selection_enabled {
            self.ui.selected_id = id;
        }
    }

    /// Apply a sparse update reported by the surface's native manipulation
    /// (select-mode move/resize).
    pub fn apply_update(&mut self, id: &ObjectId, fields: &PartialDrawable) -> Vec<Action> {
        if self.scene.apply_partial(id, fields) {
            self.surface.request_render();
            vec![Action::ObjectModified(*id)]
        } else {
            Vec::new()
        }
    }

    /// Remove every object, aborting any live gesture first so no transient
    /// object survives the wipe.
    pub fn clear(&mut self) -> Vec<Action> {
        let leftover = self.dispatch(|handler, ctx| handler.on_exit(ctx));
        if !leftover.is_empty() {
            debug!(count = leftover.len(), "discarding actions from gesture abort");
        }
        if self.scene.is_empty() {
            return Vec::new();
        }
        let ids: Vec<ObjectId> = self.scene.objects().iter().map(|o| o.id).collect();
        self.scene.clear();
        self.ui.selected_id = None;
        self.surface.request_render();
        vec![Action::ObjectsRemoved(ids)]
    }

    /// Whether a drawing/erasing gesture is mid-flight.
    #[must_use]
    pub fn gesture_active(&self) -> bool {
        self.handler.gesture_active()
    }

    // --- Serialization ---

    /// Serialize the scene to its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.scene.to_json()
    }

    /// Replace the scene from a document.
    pub fn load_document(&mut self, document: Document) {
        self.scene.load_document(document);
        self.surface.request_render();
    }

    /// Replace the scene from its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed; the scene is left
    /// untouched in that case.
    pub fn load_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let scene = Scene::from_json(json)?;
        self.scene = scene;
        self.surface.request_render();
        Ok(())
    }

    // --- Thumbnail ---

    /// Capture a thumbnail of the scene at the fixed target box, independent
    /// of the live viewport. `None` means "skip this thumbnail" — a gesture
    /// is mid-flight or the export failed.
    pub fn thumbnail(&mut self) -> Option<String> {
        let gesture_active = self.handler.gesture_active();
        thumbnail::capture(self.surface.as_mut(), &self.scene, &mut self.camera, gesture_active)
    }
}
