use chrono::NaiveDate;
use image::{Rgba, RgbaImage};

use diary_draw::canvas::{LayerMove, LayerStack, BACKGROUND_LAYER_NAME, LOADED_LAYER_NAME, WHITE};
use diary_draw::components::tools::{Tool, ToolState};
use diary_draw::controller::CanvasUpdate;
use diary_draw::io::{self, DrawingError};
use diary_draw::ops::shapes::ShapeKind;
use diary_draw::session::DrawingSession;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}

fn blank_session(dir: &std::path::Path) -> DrawingSession {
    DrawingSession::open_for_date(dir, day(), 600, 400, ToolState::default()).unwrap()
}

#[test]
fn brush_stroke_marks_the_diagonal_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = blank_session(dir.path());

    s.press((10.0, 10.0));
    s.drag((50.0, 50.0));
    s.release((50.0, 50.0));

    let composite = s.composite();
    assert_eq!(composite.dimensions(), (600, 400));
    assert!((10..=50).any(|i| *composite.get_pixel(i, i) != WHITE));
    assert_eq!(*composite.get_pixel(30, 30), Rgba([0, 0, 0, 255]));
    assert_eq!(*composite.get_pixel(500, 300), WHITE);
    assert_eq!(*composite.get_pixel(50, 10), WHITE);
}

#[test]
fn fill_on_blank_layer_turns_canvas_red() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = blank_session(dir.path());
    s.tools.set_color_hex("#ff0000");
    s.tools.select(Tool::Fill);

    assert_eq!(s.press((0.0, 0.0)), CanvasUpdate::Raster);
    s.release((0.0, 0.0));
    assert!(s.composite().pixels().all(|p| *p == RED));
}

#[test]
fn moving_drawn_layer_below_transparent_layer_keeps_it_visible() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = blank_session(dir.path());
    s.add_layer(None, None);
    s.add_layer(None, None);
    assert_eq!(s.active_index(), 0);
    assert_eq!(s.layer_names(), vec!["Layer 3", "Layer 2", BACKGROUND_LAYER_NAME]);

    s.press((100.0, 100.0));
    s.drag((200.0, 100.0));
    s.release((200.0, 100.0));

    assert!(s.move_layer(LayerMove::Down));
    assert_eq!(s.active_index(), 1);
    assert_eq!(s.layer_names()[1], "Layer 3");
    // the layer now above it is transparent, so the stroke shows through
    assert_eq!(*s.composite().get_pixel(150, 100), Rgba([0, 0, 0, 255]));
}

#[test]
fn opaque_layer_above_occludes_moved_layer() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = blank_session(dir.path());
    s.add_layer(Some("cover".into()), Some(RgbaImage::from_pixel(600, 400, RED)));
    s.add_layer(Some("ink".into()), None);

    s.press((100.0, 100.0));
    s.drag((200.0, 100.0));
    s.release((200.0, 100.0));
    assert_eq!(*s.composite().get_pixel(150, 100), Rgba([0, 0, 0, 255]));

    s.move_layer(LayerMove::Down);
    assert_eq!(s.layer_names(), vec!["cover", "ink", BACKGROUND_LAYER_NAME]);
    assert_eq!(*s.composite().get_pixel(150, 100), RED);
}

#[test]
fn undo_redo_round_trip_is_bit_exact() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = blank_session(dir.path());
    s.press((20.0, 20.0));
    s.drag((80.0, 40.0));
    s.release((80.0, 40.0));
    let first = s.layers().active_layer().pixels.clone();

    s.tools.select(Tool::Eraser);
    s.press((50.0, 0.0));
    s.drag((50.0, 100.0));
    s.release((50.0, 100.0));
    let second = s.layers().active_layer().pixels.clone();
    assert_ne!(first, second);

    assert!(s.undo());
    assert_eq!(s.layers().active_layer().pixels, first);
    assert!(s.redo());
    assert_eq!(s.layers().active_layer().pixels, second);
    assert!(!s.redo());
}

#[test]
fn shape_preview_does_not_touch_raster_until_release() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = blank_session(dir.path());
    s.tools.select(Tool::Shape(ShapeKind::Star));

    s.press((100.0, 100.0));
    s.drag((200.0, 200.0));
    s.drag((300.0, 300.0));
    assert!(s.composite().pixels().all(|p| *p == WHITE));
    assert!(s.display_image().pixels().any(|p| *p != WHITE));
    assert!(s.controller().preview().is_some());

    assert_eq!(s.release((300.0, 300.0)), CanvasUpdate::Raster);
    assert!(s.controller().preview().is_none());
    // first star vertex points straight up from the box centre
    assert_eq!(*s.composite().get_pixel(200, 100), Rgba([0, 0, 0, 255]));
    assert_eq!(s.history().undo_count(), 1);
}

#[test]
fn save_then_reopen_loads_flattened_drawing() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = blank_session(dir.path());
    assert!(!io::has_saved_drawing(dir.path(), day()));

    s.add_layer(Some("sky".into()), None);
    s.tools.set_color([0, 0, 255]);
    s.tools.select(Tool::Fill);
    s.press((5.0, 5.0));
    s.release((5.0, 5.0));
    s.save().unwrap();
    assert!(io::has_saved_drawing(dir.path(), day()));
    assert!(s.has_saved_file());

    let reopened = DrawingSession::open_for_date(dir.path(), day(), 10, 10, ToolState::default()).unwrap();
    assert_eq!(reopened.layer_names(), vec![LOADED_LAYER_NAME]);
    assert_eq!(reopened.layers().width(), 600);
    assert_eq!(reopened.layers().height(), 400);
    assert!(reopened.composite().pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
}

#[test]
fn corrupt_drawing_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = io::drawing_path_for_date(dir.path(), day());
    std::fs::write(&path, [0u8, 1, 2, 3, 4, 5]).unwrap();

    let result = DrawingSession::open(&path, 600, 400, ToolState::default());
    assert!(matches!(result, Err(DrawingError::Decode { .. })));
}

#[test]
fn layer_store_invariants_hold_through_removal() {
    let mut layers = LayerStack::new(8, 8);
    layers.add_layer(None, None);
    layers.remove_layer();
    layers.remove_layer();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers.layer_names(), vec![BACKGROUND_LAYER_NAME]);
    assert_eq!(layers.active_index(), 0);
    assert!(!layers.set_active(3));
}

#[test]
fn dragging_far_past_the_edge_stays_fast() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = DrawingSession::open_for_date(dir.path(), day(), 60, 40, ToolState::default()).unwrap();

    let started = std::time::Instant::now();
    s.press((10.0, 10.0));
    s.drag((1.0e8, 10.0));
    s.drag((f32::INFINITY, 10.0));
    s.release((1.0e8, 10.0));
    assert!(started.elapsed() < std::time::Duration::from_millis(500));

    let composite = s.composite();
    assert_eq!(*composite.get_pixel(59, 10), Rgba([0, 0, 0, 255]));
    assert_eq!(*composite.get_pixel(30, 30), WHITE);
    assert_eq!(s.history().undo_count(), 1);
}
