//! Per-tool interaction handlers.
//!
//! Each tool is a capability object implementing [`ToolHandler`]:
//! `on_enter` / `on_exit` bracket the tool's lifetime, the pointer hooks
//! drive its gesture, and `gesture_active` reports whether a drawing or
//! erasing gesture is mid-flight. The engine owns exactly one handler at a
//! time and switches it through an unconditional teardown protocol — see
//! [`crate::engine::Engine::set_tool`].
//!
//! Handlers never touch the network or the history; they communicate scene
//! mutations back to the host through returned [`Action`]s.

use std::collections::HashSet;

use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{
    ERASER_CURSOR_DASH, ERASER_CURSOR_OPACITY, ERASER_CURSOR_STROKE,
    ERASER_CURSOR_STROKE_WIDTH, ERASER_PREVIEW_OPACITY, ERASER_RADIUS_FACTOR, TRANSPARENT_FILL,
};
use crate::engine::Action;
use crate::hit;
use crate::input::{Tool, ToolSettings};
use crate::scene::{Composite, Drawable, Geometry, ObjectId};

/// Mutable view of engine state handed to tool handlers.
pub struct ToolCtx<'a> {
    pub scene: &'a mut crate::scene::Scene,
    pub camera: &'a mut crate::camera::Camera,
    pub settings: &'a ToolSettings,
    pub ui: &'a mut crate::input::UiState,
}

/// A tool state: entered on activation, exited on switch, driven by pointer
/// events delivered in screen coordinates.
///
/// `on_exit` must leave no transient object and no live gesture behind — the
/// engine calls it unconditionally before binding the next tool.
pub trait ToolHandler: Send {
    /// The tool this handler implements.
    fn tool(&self) -> Tool;

    fn on_enter(&mut self, _ctx: &mut ToolCtx<'_>) -> Vec<Action> {
        Vec::new()
    }

    fn on_exit(&mut self, _ctx: &mut ToolCtx<'_>) -> Vec<Action> {
        Vec::new()
    }

    fn on_pointer_down(&mut self, _ctx: &mut ToolCtx<'_>, _screen: Point) -> Vec<Action> {
        Vec::new()
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolCtx<'_>, _screen: Point) -> Vec<Action> {
        Vec::new()
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolCtx<'_>, _screen: Point) -> Vec<Action> {
        Vec::new()
    }

    /// Whether a drawing/erasing gesture is mid-flight. Autosave and
    /// thumbnail capture are suppressed while this is true.
    fn gesture_active(&self) -> bool {
        false
    }
}

/// Construct the handler for a tool.
#[must_use]
pub fn handler_for(tool: Tool) -> Box<dyn ToolHandler> {
    match tool {
        Tool::Select => Box::new(SelectTool),
        Tool::Brush => Box::new(BrushTool::default()),
        Tool::Eraser => Box::new(EraserTool::default()),
        Tool::Pan => Box::new(PanTool::default()),
        Tool::Rect => Box::new(ShapeTool::new(ShapeKind::Rect)),
        Tool::Circle => Box::new(ShapeTool::new(ShapeKind::Circle)),
        Tool::Line => Box::new(ShapeTool::new(ShapeKind::Line)),
    }
}

// =============================================================
// Select
// =============================================================

/// Selection tool. Hit-testing, move and resize are native to the rendering
/// surface; the engine only toggles the enabling flags, so this handler has
/// no behavior of its own.
pub struct SelectTool;

impl ToolHandler for SelectTool {
    fn tool(&self) -> Tool {
        Tool::Select
    }
}

// =============================================================
// Brush
// =============================================================

/// Freehand brush. The surface draws the live stroke natively in
/// free-drawing mode; this handler collects the pointer track and commits
/// the finished Path object on release.
#[derive(Default)]
pub struct BrushTool {
    stroke: Option<Vec<Point>>,
}

impl ToolHandler for BrushTool {
    fn tool(&self) -> Tool {
        Tool::Brush
    }

    fn on_exit(&mut self, _ctx: &mut ToolCtx<'_>) -> Vec<Action> {
        // An unfinished stroke was never added to the scene; just drop it.
        self.stroke = None;
        Vec::new()
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let world = ctx.camera.screen_to_world(screen);
        self.stroke = Some(vec![world]);
        vec![Action::RenderNeeded]
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let Some(points) = self.stroke.as_mut() else {
            return Vec::new();
        };
        points.push(ctx.camera.screen_to_world(screen));
        vec![Action::RenderNeeded]
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let Some(mut points) = self.stroke.take() else {
            return Vec::new();
        };
        points.push(ctx.camera.screen_to_world(screen));
        let object = finished_stroke(ctx.settings, points);
        let id = object.id;
        ctx.scene.add(object);
        vec![Action::StrokeCompleted(id), Action::RenderNeeded]
    }

    fn gesture_active(&self) -> bool {
        self.stroke.is_some()
    }
}

fn finished_stroke(settings: &ToolSettings, points: Vec<Point>) -> Drawable {
    let bbox = hit::points_bbox(&points).unwrap_or(hit::BBox {
        left: 0.0,
        top: 0.0,
        width: 0.0,
        height: 0.0,
    });
    Drawable {
        id: Uuid::new_v4(),
        left: bbox.left,
        top: bbox.top,
        geometry: Geometry::Path { points },
        stroke: settings.stroke_color.clone(),
        stroke_width: settings.brush_width,
        fill: TRANSPARENT_FILL.to_owned(),
        opacity: 1.0,
        // Completed strokes stay inert until the user switches to select.
        selectable: true,
        evented: false,
        stroke_uniform: true,
        stroke_dash: Vec::new(),
        composite: Composite::SourceOver,
        exclude_from_export: false,
    }
}

// =============================================================
// Eraser
// =============================================================

/// Drag-hit-test-and-delete eraser with a dashed circular cursor preview.
///
/// Objects touched by the erase circle enter a candidate set and render at
/// reduced opacity; leaving the circle restores them. Release deletes every
/// candidate in one step.
#[derive(Default)]
pub struct EraserTool {
    cursor_id: Option<ObjectId>,
    candidates: HashSet<ObjectId>,
    radius: f64,
}

impl ToolHandler for EraserTool {
    fn tool(&self) -> Tool {
        Tool::Eraser
    }

    fn on_exit(&mut self, ctx: &mut ToolCtx<'_>) -> Vec<Action> {
        if let Some(cursor_id) = self.cursor_id.take() {
            ctx.scene.remove(&cursor_id);
        }
        for id in self.candidates.drain() {
            if let Some(object) = ctx.scene.get_mut(&id) {
                object.opacity = 1.0;
            }
        }
        Vec::new()
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let world = ctx.camera.screen_to_world(screen);
        self.radius = ctx.settings.brush_width * ERASER_RADIUS_FACTOR;
        self.candidates.clear();
        let cursor = eraser_cursor(world, self.radius);
        self.cursor_id = Some(cursor.id);
        ctx.scene.add(cursor);
        vec![Action::RenderNeeded]
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let Some(cursor_id) = self.cursor_id else {
            return Vec::new();
        };
        let world = ctx.camera.screen_to_world(screen);
        if let Some(cursor) = ctx.scene.get_mut(&cursor_id) {
            cursor.left = world.x - self.radius;
            cursor.top = world.y - self.radius;
        }
        for object in ctx.scene.objects_mut() {
            if object.exclude_from_export {
                continue;
            }
            let bbox = hit::bounding_box(object);
            if hit::erase_circle_hits(world, self.radius, &bbox) {
                if self.candidates.insert(object.id) {
                    object.opacity = ERASER_PREVIEW_OPACITY;
                }
            } else if self.candidates.remove(&object.id) {
                object.opacity = 1.0;
            }
        }
        vec![Action::RenderNeeded]
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolCtx<'_>, _screen: Point) -> Vec<Action> {
        let Some(cursor_id) = self.cursor_id.take() else {
            return Vec::new();
        };
        ctx.scene.remove(&cursor_id);
        let mut removed = Vec::new();
        for id in self.candidates.drain() {
            if ctx.scene.remove(&id).is_some() {
                removed.push(id);
            }
        }
        ctx.ui.selected_id = None;
        if removed.is_empty() {
            vec![Action::RenderNeeded]
        } else {
            vec![Action::ObjectsRemoved(removed), Action::RenderNeeded]
        }
    }

    fn gesture_active(&self) -> bool {
        self.cursor_id.is_some()
    }
}

fn eraser_cursor(center: Point, radius: f64) -> Drawable {
    Drawable {
        id: Uuid::new_v4(),
        left: center.x - radius,
        top: center.y - radius,
        geometry: Geometry::Circle { radius },
        stroke: ERASER_CURSOR_STROKE.to_owned(),
        stroke_width: ERASER_CURSOR_STROKE_WIDTH,
        fill: TRANSPARENT_FILL.to_owned(),
        opacity: ERASER_CURSOR_OPACITY,
        selectable: false,
        evented: false,
        stroke_uniform: false,
        stroke_dash: ERASER_CURSOR_DASH.to_vec(),
        composite: Composite::SourceOver,
        exclude_from_export: true,
    }
}

// =============================================================
// Pan
// =============================================================

/// Pan tool — drags the camera, never the scene. Not a drawing gesture, so
/// it does not suppress autosave.
#[derive(Default)]
pub struct PanTool {
    last_screen: Option<Point>,
}

impl ToolHandler for PanTool {
    fn tool(&self) -> Tool {
        Tool::Pan
    }

    fn on_exit(&mut self, _ctx: &mut ToolCtx<'_>) -> Vec<Action> {
        self.last_screen = None;
        Vec::new()
    }

    fn on_pointer_down(&mut self, _ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        self.last_screen = Some(screen);
        vec![Action::SetCursor("grabbing")]
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let Some(last) = self.last_screen else {
            return Vec::new();
        };
        ctx.camera.pan_by(screen.x - last.x, screen.y - last.y);
        self.last_screen = Some(screen);
        vec![Action::RenderNeeded]
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolCtx<'_>, _screen: Point) -> Vec<Action> {
        self.last_screen = None;
        vec![Action::SetCursor("grab")]
    }
}

// =============================================================
// Shapes
// =============================================================

/// Which dragged-out shape a [`ShapeTool`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Circle,
    Line,
}

struct Draft {
    id: ObjectId,
    start: Point,
}

/// Drag-to-size shape tools (rectangle, circle, line).
///
/// Pointer-down inserts a zero-sized draft at the start point; pointer-move
/// re-derives the geometry from start and cursor; pointer-up finalizes the
/// object, selects it, and requests a deferred switch back to select so the
/// user can immediately reposition what was just drawn.
pub struct ShapeTool {
    kind: ShapeKind,
    draft: Option<Draft>,
}

impl ShapeTool {
    #[must_use]
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, draft: None }
    }
}

impl ToolHandler for ShapeTool {
    fn tool(&self) -> Tool {
        match self.kind {
            ShapeKind::Rect => Tool::Rect,
            ShapeKind::Circle => Tool::Circle,
            ShapeKind::Line => Tool::Line,
        }
    }

    fn on_exit(&mut self, ctx: &mut ToolCtx<'_>) -> Vec<Action> {
        // Discard an incomplete in-progress shape.
        if let Some(draft) = self.draft.take() {
            ctx.scene.remove(&draft.id);
        }
        Vec::new()
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let world = ctx.camera.screen_to_world(screen);
        let object = shape_draft(self.kind, world, ctx.settings);
        self.draft = Some(Draft { id: object.id, start: world });
        ctx.scene.add(object);
        vec![Action::RenderNeeded]
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolCtx<'_>, screen: Point) -> Vec<Action> {
        let Some(draft) = self.draft.as_ref() else {
            return Vec::new();
        };
        let world = ctx.camera.screen_to_world(screen);
        if let Some(object) = ctx.scene.get_mut(&draft.id) {
            resize_draft(object, draft.start, world);
        }
        vec![Action::RenderNeeded]
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolCtx<'_>, _screen: Point) -> Vec<Action> {
        let Some(draft) = self.draft.take() else {
            return Vec::new();
        };
        if let Some(object) = ctx.scene.get_mut(&draft.id) {
            object.selectable = true;
            object.evented = true;
        }
        ctx.ui.selected_id = Some(draft.id);
        vec![
            Action::ObjectAdded(draft.id),
            Action::SwitchTool(Tool::Select),
            Action::RenderNeeded,
        ]
    }

    fn gesture_active(&self) -> bool {
        self.draft.is_some()
    }
}

fn shape_draft(kind: ShapeKind, start: Point, settings: &ToolSettings) -> Drawable {
    let geometry = match kind {
        ShapeKind::Rect => Geometry::Rect { width: 0.0, height: 0.0 },
        ShapeKind::Circle => Geometry::Circle { radius: 0.0 },
        ShapeKind::Line => Geometry::Line { x2: start.x, y2: start.y },
    };
    Drawable {
        id: Uuid::new_v4(),
        left: start.x,
        top: start.y,
        geometry,
        stroke: settings.stroke_color.clone(),
        stroke_width: settings.brush_width,
        fill: TRANSPARENT_FILL.to_owned(),
        opacity: 1.0,
        selectable: true,
        evented: true,
        stroke_uniform: false,
        stroke_dash: Vec::new(),
        composite: Composite::SourceOver,
        exclude_from_export: false,
    }
}

fn resize_draft(object: &mut Drawable, start: Point, current: Point) {
    match &mut object.geometry {
        Geometry::Rect { width, height } => {
            object.left = start.x.min(current.x);
            object.top = start.y.min(current.y);
            *width = (current.x - start.x).abs();
            *height = (current.y - start.y).abs();
        }
        Geometry::Circle { radius } => {
            *radius = (current.x - start.x).hypot(current.y - start.y);
        }
        Geometry::Line { x2, y2 } => {
            *x2 = current.x;
            *y2 = current.y;
        }
        Geometry::Path { .. } => {}
    }
}
