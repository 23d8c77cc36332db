//! Shared numeric constants for the editing engine.

// ── Zoom ────────────────────────────────────────────────────────

/// Lower bound on the camera zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Upper bound on the camera zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Multiplier applied by one discrete zoom-in / zoom-out step.
pub const ZOOM_STEP: f64 = 1.1;

/// Wheel deltas below this magnitude (in pixels) are treated as continuous
/// trackpad input and scaled by [`WHEEL_FINE_RATE`].
pub const WHEEL_STEP_THRESHOLD: f64 = 50.0;

/// Zoom factor change per pixel of fine (trackpad) wheel delta.
pub const WHEEL_FINE_RATE: f64 = 0.001;

/// Multiplier applied by one coarse (physical wheel) notch.
pub const WHEEL_COARSE_STEP: f64 = 1.05;

// ── Eraser ──────────────────────────────────────────────────────

/// Erase radius as a multiple of the current stroke width.
pub const ERASER_RADIUS_FACTOR: f64 = 3.0;

/// Opacity applied to objects marked for deletion while the eraser hovers them.
pub const ERASER_PREVIEW_OPACITY: f64 = 0.3;

/// Opacity of the dashed eraser cursor preview.
pub const ERASER_CURSOR_OPACITY: f64 = 0.6;

/// Stroke color of the eraser cursor preview.
pub const ERASER_CURSOR_STROKE: &str = "#999999";

/// Stroke width of the eraser cursor preview.
pub const ERASER_CURSOR_STROKE_WIDTH: f64 = 2.0;

/// Dash pattern of the eraser cursor preview.
pub const ERASER_CURSOR_DASH: [f64; 2] = [5.0, 5.0];

// ── Defaults ────────────────────────────────────────────────────

/// Background fill of a freshly created scene.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// Initial stroke color for new sessions.
pub const DEFAULT_STROKE_COLOR: &str = "#000000";

/// Initial brush width for new sessions.
pub const DEFAULT_BRUSH_WIDTH: f64 = 3.0;

/// Fill used by outline-only shapes and tool previews.
pub const TRANSPARENT_FILL: &str = "transparent";

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo/redo snapshots kept per session.
pub const HISTORY_CAPACITY: usize = 50;

// ── Save scheduling ─────────────────────────────────────────────

/// Inactivity window before a content-only autosave fires, in milliseconds.
pub const CONTENT_SAVE_WINDOW_MS: u64 = 2000;

/// Inactivity window before a content-plus-thumbnail autosave fires, in milliseconds.
pub const THUMBNAIL_SAVE_WINDOW_MS: u64 = 5000;

/// How often the background autosave task checks for due work, in milliseconds.
pub const AUTOSAVE_TICK_MS: u64 = 250;

/// How long the "saved" status is shown before reverting to idle, in milliseconds.
pub const SAVED_STATUS_RESET_MS: u64 = 2000;

/// Delay between scene load and settings re-apply, in milliseconds.
pub const SETTLE_DELAY_MS: u64 = 50;

/// Zoom poll interval, in milliseconds (10 Hz).
pub const ZOOM_POLL_MS: u64 = 100;

// ── Thumbnail ───────────────────────────────────────────────────

/// Thumbnail target box width in pixels.
pub const THUMBNAIL_WIDTH: f64 = 300.0;

/// Thumbnail target box height in pixels.
pub const THUMBNAIL_HEIGHT: f64 = 200.0;
