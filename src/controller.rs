//! Pointer gesture state machine.
//!
//! Translates press / drag / release / hover events into paint operations on
//! the active layer.  Exactly one undo snapshot is taken per gesture, at
//! press time, before anything is painted.

use image::{Rgba, RgbaImage};

use crate::canvas::{blend_pixel, LayerStack, TRANSPARENT};
use crate::components::history::HistoryManager;
use crate::components::tools::{CursorRing, PaintOp, ToolState};
use crate::ops::raster;
use crate::ops::shapes::{self, ShapeKind, ShapePath};
use crate::ops::Point;

/// What a pointer event changed, so the display knows how much to redo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasUpdate {
    /// Nothing visible changed.
    None,
    /// Only the transient overlay (cursor ring, shape preview) changed.
    Overlay,
    /// Layer pixels changed; the stack must be recomposited.
    Raster,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Brush or eraser held down; `last` is where the previous segment ended.
    Stroking { op: PaintOp, last: Point },
    /// Shape tool held down; nothing is committed until release.
    ShapeDragging {
        kind: ShapeKind,
        color: Rgba<u8>,
        width: u32,
        start: Point,
        current: Point,
    },
}

/// Transient outline shown while a shape is being dragged.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapePreview {
    pub path: ShapePath,
    pub color: Rgba<u8>,
    pub width: u32,
}

#[derive(Default)]
pub struct InteractionController {
    state: GestureState,
    cursor: Option<CursorRing>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn cursor(&self) -> Option<CursorRing> {
        self.cursor
    }

    /// Pointer pressed.  Ignored while a gesture is already in progress.
    pub fn press(
        &mut self,
        pos: Point,
        layers: &mut LayerStack,
        history: &mut HistoryManager,
        tools: &ToolState,
    ) -> CanvasUpdate {
        if !self.is_idle() {
            return CanvasUpdate::None;
        }
        history.snapshot_before_edit(layers);
        self.cursor = tools.cursor_ring(pos);

        match tools.paint_op() {
            op @ (PaintOp::Brush { .. } | PaintOp::Eraser { .. }) => {
                self.state = GestureState::Stroking { op, last: pos };
                CanvasUpdate::Overlay
            }
            op @ PaintOp::Fill { .. } => {
                // no drag phase: fill at once and stay idle
                op.apply(layers.active_pixels_mut(), pos, pos);
                CanvasUpdate::Raster
            }
            PaintOp::Shape { kind, color, width } => {
                self.state = GestureState::ShapeDragging { kind, color, width, start: pos, current: pos };
                CanvasUpdate::Overlay
            }
        }
    }

    /// Pointer moved with the button held.
    pub fn drag(&mut self, pos: Point, layers: &mut LayerStack, tools: &ToolState) -> CanvasUpdate {
        self.cursor = tools.cursor_ring(pos);
        match &mut self.state {
            GestureState::Stroking { op, last } => {
                op.apply(layers.active_pixels_mut(), *last, pos);
                *last = pos;
                CanvasUpdate::Raster
            }
            GestureState::ShapeDragging { current, .. } => {
                *current = pos;
                CanvasUpdate::Overlay
            }
            GestureState::Idle => CanvasUpdate::Overlay,
        }
    }

    /// Pointer released.  A dragged shape is re-derived from `pos` and
    /// committed; strokes were already committed segment by segment.
    pub fn release(&mut self, pos: Point, layers: &mut LayerStack) -> CanvasUpdate {
        match std::mem::take(&mut self.state) {
            GestureState::ShapeDragging { kind, color, width, start, .. } => {
                PaintOp::Shape { kind, color, width }.apply(layers.active_pixels_mut(), start, pos);
                CanvasUpdate::Raster
            }
            GestureState::Stroking { .. } => CanvasUpdate::Raster,
            GestureState::Idle => CanvasUpdate::None,
        }
    }

    /// Pointer moved without the button held.
    pub fn hover(&mut self, pos: Point, tools: &ToolState) -> CanvasUpdate {
        let ring = tools.cursor_ring(pos);
        if ring == self.cursor {
            return CanvasUpdate::None;
        }
        self.cursor = ring;
        CanvasUpdate::Overlay
    }

    /// Pointer left the canvas.
    pub fn leave(&mut self) -> CanvasUpdate {
        if self.cursor.take().is_some() {
            CanvasUpdate::Overlay
        } else {
            CanvasUpdate::None
        }
    }

    /// Outline of the shape being dragged, recomputed from the current state.
    pub fn preview(&self) -> Option<ShapePreview> {
        match self.state {
            GestureState::ShapeDragging { kind, color, width, start, current } => Some(ShapePreview {
                path: kind.path(start, current),
                color,
                width,
            }),
            _ => None,
        }
    }

    /// Draw the transient overlay (shape preview, then cursor ring) on top of
    /// a composited image.  The layers themselves are never touched.
    pub fn render_overlay(&self, composite: &RgbaImage) -> RgbaImage {
        let mut out = composite.clone();

        if let Some(preview) = self.preview() {
            let (w, h) = out.dimensions();
            let mut overlay = RgbaImage::from_pixel(w, h, TRANSPARENT);
            raster::stroke_polyline(
                &mut overlay,
                &preview.path.points,
                preview.path.closed,
                preview.width as f32,
                preview.color,
            );
            for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
                if src[3] > 0 {
                    *dst = blend_pixel(*dst, *src);
                }
            }
        }

        if let Some(ring) = self.cursor {
            let r = ring.diameter / 2.0;
            let (cx, cy) = ring.center;
            let outline = shapes::oval_points((cx - r, cy - r), (cx + r, cy + r));
            let [red, green, blue] = ring.color;
            raster::stroke_polyline(&mut out, &outline, true, 1.0, Rgba([red, green, blue, 255]));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tools::Tool;

    struct Rig {
        layers: LayerStack,
        history: HistoryManager,
        tools: ToolState,
        ctl: InteractionController,
    }

    impl Rig {
        fn new(tool: Tool) -> Self {
            let mut tools = ToolState::default();
            tools.select(tool);
            Self {
                layers: LayerStack::new(60, 60),
                history: HistoryManager::new(),
                tools,
                ctl: InteractionController::new(),
            }
        }

        fn press(&mut self, p: Point) -> CanvasUpdate {
            self.ctl.press(p, &mut self.layers, &mut self.history, &self.tools)
        }

        fn drag(&mut self, p: Point) -> CanvasUpdate {
            self.ctl.drag(p, &mut self.layers, &self.tools)
        }

        fn release(&mut self, p: Point) -> CanvasUpdate {
            self.ctl.release(p, &mut self.layers)
        }

        fn inked(&self) -> usize {
            self.layers.active_layer().pixels.pixels().filter(|p| p[3] > 0).count()
        }
    }

    #[test]
    fn brush_gesture_paints_incrementally_with_one_snapshot() {
        let mut rig = Rig::new(Tool::Brush);
        assert_eq!(rig.press((5.0, 5.0)), CanvasUpdate::Overlay);
        assert!(matches!(rig.ctl.state(), GestureState::Stroking { .. }));
        assert_eq!(rig.inked(), 0);

        assert_eq!(rig.drag((20.0, 5.0)), CanvasUpdate::Raster);
        let after_first = rig.inked();
        assert!(after_first > 0);
        rig.drag((20.0, 30.0));
        assert!(rig.inked() > after_first);

        assert_eq!(rig.release((20.0, 30.0)), CanvasUpdate::Raster);
        assert!(rig.ctl.is_idle());
        assert_eq!(rig.history.undo_count(), 1);
    }

    #[test]
    fn fill_happens_on_press_and_returns_to_idle() {
        let mut rig = Rig::new(Tool::Fill);
        assert_eq!(rig.press((0.0, 0.0)), CanvasUpdate::Raster);
        assert!(rig.ctl.is_idle());
        assert_eq!(rig.inked(), 60 * 60);
        assert_eq!(rig.release((0.0, 0.0)), CanvasUpdate::None);
        assert_eq!(rig.history.undo_count(), 1);
    }

    #[test]
    fn shape_is_previewed_during_drag_and_committed_on_release() {
        let mut rig = Rig::new(Tool::Shape(ShapeKind::Rectangle));
        rig.press((10.0, 10.0));
        assert_eq!(rig.drag((30.0, 30.0)), CanvasUpdate::Overlay);
        assert_eq!(rig.drag((40.0, 40.0)), CanvasUpdate::Overlay);
        assert_eq!(rig.inked(), 0);

        let preview = rig.ctl.preview().unwrap();
        assert_eq!(preview.path.points[2], (40.0, 40.0));

        // final endpoint differs from the last drag position
        rig.release((50.0, 50.0));
        assert!(rig.ctl.preview().is_none());
        assert_eq!(rig.layers.active_layer().pixels.get_pixel(50, 30)[3], 255);
        assert_eq!(rig.layers.active_layer().pixels.get_pixel(40, 40)[3], 0);
    }

    #[test]
    fn press_during_gesture_is_ignored() {
        let mut rig = Rig::new(Tool::Brush);
        rig.press((1.0, 1.0));
        assert_eq!(rig.press((2.0, 2.0)), CanvasUpdate::None);
        assert_eq!(rig.history.undo_count(), 1);
    }

    #[test]
    fn drag_and_release_without_press_do_not_paint() {
        let mut rig = Rig::new(Tool::Brush);
        rig.drag((3.0, 3.0));
        assert_eq!(rig.release((9.0, 9.0)), CanvasUpdate::None);
        assert_eq!(rig.inked(), 0);
        assert_eq!(rig.history.undo_count(), 0);
    }

    #[test]
    fn hover_tracks_cursor_ring_and_hides_it_for_shapes() {
        let mut rig = Rig::new(Tool::Eraser);
        assert_eq!(rig.ctl.hover((10.0, 10.0), &rig.tools), CanvasUpdate::Overlay);
        assert_eq!(rig.ctl.cursor().unwrap().diameter, 20.0);
        assert_eq!(rig.ctl.hover((10.0, 10.0), &rig.tools), CanvasUpdate::None);

        rig.tools.select(Tool::Shape(ShapeKind::Heart));
        rig.ctl.hover((11.0, 10.0), &rig.tools);
        assert!(rig.ctl.cursor().is_none());
    }

    #[test]
    fn overlay_rendering_leaves_layers_untouched() {
        let mut rig = Rig::new(Tool::Shape(ShapeKind::Line));
        rig.press((5.0, 30.0));
        rig.drag((55.0, 30.0));
        let composite = rig.layers.composite();
        let shown = rig.ctl.render_overlay(&composite);
        assert_eq!(*shown.get_pixel(30, 30), Rgba([0, 0, 0, 255]));
        assert_eq!(rig.inked(), 0);
    }
}
