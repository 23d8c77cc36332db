//! Input model: tools, pointer/wheel event values, and session-visible
//! interaction state.
//!
//! `Tool` captures the user's intent; `UiState` is the engine-owned state the
//! renderer and host read (active tool, selection, global interaction flags).
//! The per-gesture state lives inside the active tool handler — see
//! [`crate::tools`].

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::{DEFAULT_BRUSH_WIDTH, DEFAULT_STROKE_COLOR};
use crate::scene::ObjectId;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool.
    #[default]
    Select,
    /// Freehand brush.
    Brush,
    /// Drag-to-delete eraser.
    Eraser,
    /// Viewport pan.
    Pan,
    /// Draw a rectangle.
    Rect,
    /// Draw a circle.
    Circle,
    /// Draw a straight line segment.
    Line,
}

impl Tool {
    /// Whether this tool creates a dragged-out shape (rect, circle, line).
    #[must_use]
    pub fn is_shape(self) -> bool {
        matches!(self, Self::Rect | Self::Circle | Self::Line)
    }

    /// The surface cursor shown while this tool is idle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Pan => "grab",
            Self::Brush | Self::Eraser | Self::Rect | Self::Circle | Self::Line => "crosshair",
        }
    }
}

/// Wheel / trackpad scroll delta in pixels (positive `dy` = down).
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Stroke settings applied to newly created objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    /// Stroke color as a CSS color string.
    pub stroke_color: String,
    /// Brush / outline width in scene units.
    pub brush_width: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            stroke_color: DEFAULT_STROKE_COLOR.to_owned(),
            brush_width: DEFAULT_BRUSH_WIDTH,
        }
    }
}

/// Persistent interaction state visible to the renderer and the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// The id of the currently selected object, if any.
    pub selected_id: Option<ObjectId>,
    /// Surface free-drawing mode — on only while the brush tool is active.
    pub free_drawing: bool,
    /// Surface-native selection — on only while the select tool is active.
    pub selection_enabled: bool,
}

impl UiState {
    /// Update the global interaction flags for a tool switch. Switching away
    /// from select also discards the active selection.
    pub fn apply_tool_flags(&mut self, tool: Tool) {
        self.tool = tool;
        self.free_drawing = tool == Tool::Brush;
        self.selection_enabled = tool == Tool::Select;
        if tool != Tool::Select {
            self.selected_id = None;
        }
    }
}
