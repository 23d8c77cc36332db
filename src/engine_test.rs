#![allow(clippy::float_cmp)]

use super::*;
use crate::camera::Point;
use crate::input::{Tool, WheelDelta};
use crate::scene::{Geometry, PartialDrawable};
use crate::surface::surface_test::RecordingSurface;

fn engine() -> Engine {
    let (surface, _log) = RecordingSurface::new();
    Engine::new(surface)
}

fn engine_with_log() -> (Engine, std::sync::Arc<std::sync::Mutex<crate::surface::surface_test::SurfaceLog>>)
{
    let (surface, log) = RecordingSurface::new();
    (Engine::new(surface), log)
}

fn draw_rect(engine: &mut Engine, from: Point, to: Point) -> Vec<Action> {
    engine.set_tool(Tool::Rect);
    let mut actions = engine.pointer_down(from);
    actions.extend(engine.pointer_move(to));
    actions.extend(engine.pointer_up(to));
    actions
}

// =============================================================
// Tool state machine
// =============================================================

#[test]
fn new_engine_starts_in_select() {
    let engine = engine();
    assert_eq!(engine.tool(), Tool::Select);
    assert!(!engine.gesture_active());
}

#[test]
fn set_tool_updates_cursor() {
    let (mut engine, log) = engine_with_log();
    engine.set_tool(Tool::Brush);
    engine.set_tool(Tool::Pan);
    let cursors = log.lock().unwrap().cursors.clone();
    assert!(cursors.contains(&"crosshair".to_owned()));
    assert_eq!(cursors.last().map(String::as_str), Some("grab"));
}

#[test]
fn switching_mid_shape_discards_draft() {
    let mut engine = engine();
    engine.set_tool(Tool::Rect);
    engine.pointer_down(Point::new(10.0, 10.0));
    engine.pointer_move(Point::new(40.0, 40.0));
    assert!(engine.gesture_active());
    assert_eq!(engine.scene().len(), 1);

    engine.set_tool(Tool::Brush);
    assert!(!engine.gesture_active());
    assert!(engine.scene().is_empty(), "in-progress draft must be discarded");
}

#[test]
fn switching_mid_erase_removes_preview_and_restores_opacity() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
    engine.set_tool(Tool::Select);

    engine.set_tool(Tool::Eraser);
    engine.pointer_down(Point::new(10.0, 10.0));
    engine.pointer_move(Point::new(10.0, 10.0));
    assert!(engine.gesture_active());
    assert_eq!(engine.scene().len(), 2, "cursor preview is in the scene");

    engine.set_tool(Tool::Select);
    assert_eq!(engine.scene().len(), 1, "preview removed on switch");
    let object = &engine.scene().objects()[0];
    assert_eq!(object.opacity, 1.0, "deletion preview opacity restored");
    assert!(!object.exclude_from_export);
}

#[test]
fn no_transient_objects_after_any_tool_transition() {
    let tools = [
        Tool::Brush,
        Tool::Eraser,
        Tool::Pan,
        Tool::Rect,
        Tool::Circle,
        Tool::Line,
        Tool::Select,
    ];
    let mut engine = engine();
    for from in tools {
        engine.set_tool(from);
        engine.pointer_down(Point::new(5.0, 5.0));
        engine.pointer_move(Point::new(15.0, 15.0));
        for to in tools {
            engine.set_tool(to);
            assert!(
                engine.scene().objects().iter().all(|o| !o.exclude_from_export),
                "transient object leaked switching {from:?} -> {to:?}"
            );
            assert!(!engine.gesture_active(), "gesture leaked switching {from:?} -> {to:?}");
        }
        engine.clear();
    }
}

#[test]
fn select_mode_enables_object_interactivity() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    engine.set_tool(Tool::Select);
    assert!(engine.scene().objects()[0].selectable);
    assert!(engine.scene().objects()[0].evented);

    engine.set_tool(Tool::Brush);
    assert!(!engine.scene().objects()[0].selectable);
    assert!(!engine.scene().objects()[0].evented);
}

#[test]
fn free_drawing_flag_follows_brush_tool() {
    let (mut engine, log) = engine_with_log();
    engine.set_tool(Tool::Brush);
    engine.set_tool(Tool::Pan);
    let calls = log.lock().unwrap().free_drawing.clone();
    let brush_on = calls.iter().any(|(enabled, _, _)| *enabled);
    assert!(brush_on);
    assert_eq!(calls.last().map(|(enabled, _, _)| *enabled), Some(false));
}

// =============================================================
// Brush
// =============================================================

#[test]
fn brush_stroke_commits_uniform_inert_path() {
    let mut engine = engine();
    engine.set_tool(Tool::Brush);
    let mut actions = engine.pointer_down(Point::new(10.0, 10.0));
    actions.extend(engine.pointer_move(Point::new(20.0, 25.0)));
    actions.extend(engine.pointer_up(Point::new(30.0, 15.0)));

    assert!(actions.iter().any(|a| matches!(a, Action::StrokeCompleted(_))));
    assert_eq!(engine.scene().len(), 1);
    let path = &engine.scene().objects()[0];
    assert!(path.stroke_uniform);
    assert!(path.selectable);
    assert!(!path.evented, "fresh strokes stay inert until select mode");
    let Geometry::Path { points } = &path.geometry else {
        panic!("expected a path");
    };
    assert_eq!(points.len(), 3);
    assert_eq!(path.left, 10.0);
    assert_eq!(path.top, 10.0);
}

#[test]
fn brush_points_are_world_coordinates() {
    let mut engine = engine();
    engine.set_tool(Tool::Brush);
    // zoom in 2x around the origin, then stroke at screen (20, 20)
    engine.wheel(Point::new(0.0, 0.0), WheelDelta { dx: 0.0, dy: -120.0 });
    let zoom = engine.zoom();
    engine.pointer_down(Point::new(20.0, 20.0));
    engine.pointer_up(Point::new(20.0, 20.0));
    let Geometry::Path { points } = &engine.scene().objects()[0].geometry else {
        panic!("expected a path");
    };
    assert!((points[0].x - 20.0 / zoom).abs() < 1e-9);
}

#[test]
fn brush_move_without_down_is_ignored() {
    let mut engine = engine();
    engine.set_tool(Tool::Brush);
    let actions = engine.pointer_move(Point::new(5.0, 5.0));
    assert!(actions.is_empty());
    let actions = engine.pointer_up(Point::new(5.0, 5.0));
    assert!(actions.is_empty());
    assert!(engine.scene().is_empty());
}

// =============================================================
// Eraser
// =============================================================

#[test]
fn eraser_release_deletes_touched_object() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
    assert_eq!(engine.scene().len(), 1);

    engine.set_tool(Tool::Eraser);
    engine.pointer_down(Point::new(10.0, 10.0));
    engine.pointer_move(Point::new(10.0, 10.0));
    let actions = engine.pointer_up(Point::new(10.0, 10.0));

    assert!(actions.iter().any(|a| matches!(a, Action::ObjectsRemoved(ids) if ids.len() == 1)));
    assert!(engine.scene().is_empty());
}

#[test]
fn eraser_preview_fades_and_restores() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
    let id = engine.scene().objects()[0].id;

    engine.set_tool(Tool::Eraser);
    engine.pointer_down(Point::new(10.0, 10.0));
    engine.pointer_move(Point::new(10.0, 10.0));
    assert!(engine.scene().get(&id).unwrap().opacity < 1.0, "touched object fades");

    engine.pointer_move(Point::new(500.0, 500.0));
    assert_eq!(engine.scene().get(&id).unwrap().opacity, 1.0, "leaving restores opacity");

    let actions = engine.pointer_up(Point::new(500.0, 500.0));
    assert!(!actions.iter().any(Action::is_mutation), "nothing deleted");
    assert_eq!(engine.scene().len(), 1);
}

#[test]
fn eraser_cursor_preview_is_transient_and_sized() {
    let mut engine = engine();
    engine.set_brush_width(5.0);
    engine.set_tool(Tool::Eraser);
    engine.pointer_down(Point::new(50.0, 50.0));

    let cursor = engine
        .scene()
        .objects()
        .iter()
        .find(|o| o.exclude_from_export)
        .expect("cursor preview present");
    let Geometry::Circle { radius } = &cursor.geometry else {
        panic!("expected a circle cursor");
    };
    assert_eq!(*radius, 15.0, "erase radius is 3x stroke width");
    assert!(!cursor.stroke_dash.is_empty(), "cursor is dashed");
    assert!(!cursor.selectable);
}

#[test]
fn eraser_ignores_transient_objects() {
    let mut engine = engine();
    engine.set_tool(Tool::Eraser);
    engine.pointer_down(Point::new(10.0, 10.0));
    // the only object is the cursor preview itself; it must not self-delete
    engine.pointer_move(Point::new(11.0, 11.0));
    let actions = engine.pointer_up(Point::new(11.0, 11.0));
    assert!(!actions.iter().any(Action::is_mutation));
    assert!(engine.scene().is_empty());
}

#[test]
fn eraser_deletes_every_object_under_cursor_at_release() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    draw_rect(&mut engine, Point::new(14.0, 0.0), Point::new(24.0, 10.0));
    draw_rect(&mut engine, Point::new(300.0, 300.0), Point::new(310.0, 310.0));

    engine.set_tool(Tool::Eraser);
    engine.pointer_down(Point::new(12.0, 5.0));
    engine.pointer_move(Point::new(12.0, 5.0));
    let actions = engine.pointer_up(Point::new(12.0, 5.0));

    assert!(actions.iter().any(|a| matches!(a, Action::ObjectsRemoved(ids) if ids.len() == 2)));
    assert_eq!(engine.scene().len(), 1, "distant object untouched");
}

#[test]
fn eraser_sweep_restores_objects_it_leaves_behind() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    draw_rect(&mut engine, Point::new(40.0, 0.0), Point::new(50.0, 10.0));

    engine.set_tool(Tool::Eraser);
    engine.pointer_down(Point::new(5.0, 5.0));
    engine.pointer_move(Point::new(5.0, 5.0));
    engine.pointer_move(Point::new(45.0, 5.0));
    let actions = engine.pointer_up(Point::new(45.0, 5.0));

    // only the object still under the cursor at release is deleted
    assert!(actions.iter().any(|a| matches!(a, Action::ObjectsRemoved(ids) if ids.len() == 1)));
    assert_eq!(engine.scene().len(), 1);
    assert_eq!(engine.scene().objects()[0].left, 0.0, "swept-past object survives, restored");
    assert_eq!(engine.scene().objects()[0].opacity, 1.0);
}

// =============================================================
// Pan
// =============================================================

#[test]
fn pan_drag_translates_camera_only() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    engine.set_tool(Tool::Pan);

    let actions_down = engine.pointer_down(Point::new(100.0, 100.0));
    let actions_move = engine.pointer_move(Point::new(130.0, 80.0));
    let actions_up = engine.pointer_up(Point::new(130.0, 80.0));

    assert_eq!(engine.camera().pan_x, 30.0);
    assert_eq!(engine.camera().pan_y, -20.0);
    for actions in [actions_down, actions_move, actions_up] {
        assert!(!actions.iter().any(Action::is_mutation), "panning never mutates the scene");
    }
    assert_eq!(engine.scene().len(), 1);
}

#[test]
fn pan_gesture_does_not_block_saves() {
    let mut engine = engine();
    engine.set_tool(Tool::Pan);
    engine.pointer_down(Point::new(0.0, 0.0));
    assert!(!engine.gesture_active());
}

// =============================================================
// Shapes
// =============================================================

#[test]
fn rect_drag_produces_expected_geometry_and_selects() {
    let mut engine = engine();
    let actions = draw_rect(&mut engine, Point::new(10.0, 10.0), Point::new(110.0, 60.0));

    assert_eq!(engine.scene().len(), 1);
    let object = &engine.scene().objects()[0];
    assert_eq!(object.left, 10.0);
    assert_eq!(object.top, 10.0);
    assert_eq!(object.geometry, Geometry::Rect { width: 100.0, height: 50.0 });
    assert_eq!(engine.selection(), Some(object.id));
    assert!(actions.contains(&Action::SwitchTool(Tool::Select)));
}

#[test]
fn rect_drag_up_left_normalizes_origin() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(110.0, 60.0), Point::new(10.0, 10.0));
    let object = &engine.scene().objects()[0];
    assert_eq!(object.left, 10.0);
    assert_eq!(object.top, 10.0);
    assert_eq!(object.geometry, Geometry::Rect { width: 100.0, height: 50.0 });
}

#[test]
fn circle_radius_is_euclidean_distance() {
    let mut engine = engine();
    engine.set_tool(Tool::Circle);
    engine.pointer_down(Point::new(0.0, 0.0));
    engine.pointer_move(Point::new(3.0, 4.0));
    engine.pointer_up(Point::new(3.0, 4.0));
    assert_eq!(engine.scene().objects()[0].geometry, Geometry::Circle { radius: 5.0 });
}

#[test]
fn line_second_endpoint_tracks_cursor() {
    let mut engine = engine();
    engine.set_tool(Tool::Line);
    engine.pointer_down(Point::new(5.0, 5.0));
    engine.pointer_move(Point::new(50.0, 60.0));
    engine.pointer_up(Point::new(50.0, 60.0));
    let object = &engine.scene().objects()[0];
    assert_eq!(object.left, 5.0);
    assert_eq!(object.top, 5.0);
    assert_eq!(object.geometry, Geometry::Line { x2: 50.0, y2: 60.0 });
}

#[test]
fn shape_draft_uses_current_settings() {
    let mut engine = engine();
    engine.set_stroke_color("#FF0000".to_owned());
    engine.set_brush_width(7.0);
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    let object = &engine.scene().objects()[0];
    assert_eq!(object.stroke, "#FF0000");
    assert_eq!(object.stroke_width, 7.0);
    assert_eq!(object.fill, "transparent");
}

#[test]
fn shape_mutation_reported_only_on_release() {
    let mut engine = engine();
    engine.set_tool(Tool::Rect);
    let down = engine.pointer_down(Point::new(0.0, 0.0));
    let moved = engine.pointer_move(Point::new(10.0, 10.0));
    assert!(!down.iter().any(Action::is_mutation));
    assert!(!moved.iter().any(Action::is_mutation));
    let up = engine.pointer_up(Point::new(10.0, 10.0));
    assert!(up.iter().any(Action::is_mutation));
}

// =============================================================
// Viewport
// =============================================================

#[test]
fn wheel_zoom_keeps_cursor_point_fixed() {
    let mut engine = engine();
    let screen = Point::new(200.0, 150.0);
    let before = engine.camera().screen_to_world(screen);
    engine.wheel(screen, WheelDelta { dx: 0.0, dy: -120.0 });
    let after = engine.camera().screen_to_world(screen);
    assert!((before.x - after.x).abs() < 1e-9);
    assert!((before.y - after.y).abs() < 1e-9);
    assert!(engine.zoom() > 1.0);
}

#[test]
fn zoom_commands_clamp_and_reset() {
    let mut engine = engine();
    for _ in 0..200 {
        engine.zoom_in();
    }
    assert_eq!(engine.zoom(), 5.0);
    engine.reset_zoom();
    assert_eq!(engine.zoom(), 1.0);
    assert_eq!(engine.camera().pan_x, 0.0);
    for _ in 0..200 {
        engine.zoom_out();
    }
    assert_eq!(engine.zoom(), 0.1);
}

#[test]
fn zoom_while_brushing_reapplies_brush_width() {
    let (mut engine, log) = engine_with_log();
    engine.set_tool(Tool::Brush);
    let calls_before = log.lock().unwrap().free_drawing.len();
    engine.zoom_in();
    let calls_after = log.lock().unwrap().free_drawing.len();
    assert_eq!(calls_after, calls_before + 1);
}

// =============================================================
// Scene commands
// =============================================================

#[test]
fn clear_reports_removed_ids() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    draw_rect(&mut engine, Point::new(20.0, 20.0), Point::new(30.0, 30.0));
    let actions = engine.clear();
    assert!(matches!(&actions[0], Action::ObjectsRemoved(ids) if ids.len() == 2));
    assert!(engine.scene().is_empty());
    assert_eq!(engine.selection(), None);
}

#[test]
fn clear_on_empty_scene_reports_nothing() {
    let mut engine = engine();
    assert!(engine.clear().is_empty());
}

#[test]
fn apply_update_moves_object_and_reports_modification() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    let id = engine.scene().objects()[0].id;
    let actions = engine.apply_update(
        &id,
        &PartialDrawable { left: Some(40.0), top: Some(50.0), ..PartialDrawable::default() },
    );
    assert_eq!(actions, vec![Action::ObjectModified(id)]);
    assert_eq!(engine.scene().get(&id).unwrap().left, 40.0);
}

#[test]
fn apply_update_unknown_object_reports_nothing() {
    let mut engine = engine();
    let actions = engine.apply_update(&uuid::Uuid::new_v4(), &PartialDrawable::default());
    assert!(actions.is_empty());
}

#[test]
fn set_selection_respects_select_mode() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    let id = engine.scene().objects()[0].id;
    engine.set_tool(Tool::Select);
    engine.set_selection(Some(id));
    assert_eq!(engine.selection(), Some(id));

    engine.set_tool(Tool::Brush);
    assert_eq!(engine.selection(), None, "leaving select discards the selection");
    engine.set_selection(Some(id));
    assert_eq!(engine.selection(), None, "selection ignored outside select mode");
}

// =============================================================
// Serialization and thumbnails
// =============================================================

#[test]
fn load_json_round_trips_through_engine() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(10.0, 10.0), Point::new(110.0, 60.0));
    let json = engine.to_json().unwrap();

    let mut restored = self::engine();
    restored.load_json(&json).unwrap();
    assert_eq!(restored.scene().len(), 1);
    assert_eq!(
        restored.scene().objects()[0].geometry,
        Geometry::Rect { width: 100.0, height: 50.0 }
    );
}

#[test]
fn load_json_rejects_garbage_and_keeps_scene() {
    let mut engine = engine();
    draw_rect(&mut engine, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    assert!(engine.load_json("{{{").is_err());
    assert_eq!(engine.scene().len(), 1);
}

#[test]
fn thumbnail_resets_and_restores_camera() {
    let (mut engine, log) = engine_with_log();
    engine.wheel(Point::new(100.0, 100.0), WheelDelta { dx: 0.0, dy: -120.0 });
    engine.set_tool(Tool::Pan);
    engine.pointer_down(Point::new(0.0, 0.0));
    engine.pointer_move(Point::new(37.0, 19.0));
    engine.pointer_up(Point::new(37.0, 19.0));
    let camera_before = engine.camera();

    let thumbnail = engine.thumbnail();
    assert!(thumbnail.is_some());
    assert_eq!(engine.camera(), camera_before, "camera restored exactly");

    let exports = log.lock().unwrap().exports.clone();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].zoom, 1.0, "export sees the identity camera");
    assert_eq!(exports[0].pan_x, 0.0);
    assert_eq!(exports[0].pan_y, 0.0);
}

#[test]
fn thumbnail_skipped_mid_gesture() {
    let mut engine = engine();
    engine.set_tool(Tool::Rect);
    engine.pointer_down(Point::new(0.0, 0.0));
    assert!(engine.thumbnail().is_none());
    engine.pointer_up(Point::new(10.0, 10.0));
    assert!(engine.thumbnail().is_some());
}

#[test]
fn thumbnail_multiplier_fits_target_box() {
    let (surface, log) = RecordingSurface::with_viewport(600.0, 400.0);
    let mut engine = Engine::new(surface);
    engine.thumbnail();
    let exports = log.lock().unwrap().exports.clone();
    // min(300/600, 200/400) = 0.5
    assert_eq!(exports[0].multiplier, 0.5);
}
