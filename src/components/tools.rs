use image::{Rgba, RgbaImage};

use crate::canvas::TRANSPARENT;
use crate::ops::Point;
use crate::ops::raster;
use crate::ops::shapes::ShapeKind;

/// Quick-pick widths offered next to the size slider.
pub const SIZE_PRESETS: &[u32] = &[1, 5, 10, 20];
pub const MIN_WIDTH: u32 = 1;
pub const MAX_WIDTH: u32 = 50;

pub const DEFAULT_BRUSH_WIDTH: u32 = 5;
pub const DEFAULT_ERASER_WIDTH: u32 = 20;

/// Ring colour shown around the eraser cursor.
const ERASER_CURSOR_COLOR: [u8; 3] = [128, 128, 128];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
    Shape(ShapeKind),
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Fill => "Fill",
            Tool::Shape(kind) => kind.label(),
        }
    }
}

// ============================================================================
// COLOURS
// ============================================================================

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

pub fn to_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

// ============================================================================
// TOOL STATE
// ============================================================================

/// Current tool plus its settings.  Brush and shape tools share
/// `brush_width`; the eraser has its own width; fill has none.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolState {
    pub tool: Tool,
    color: [u8; 3],
    brush_width: u32,
    eraser_width: u32,
    opacity: u8,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Brush,
            color: [0, 0, 0],
            brush_width: DEFAULT_BRUSH_WIDTH,
            eraser_width: DEFAULT_ERASER_WIDTH,
            opacity: 255,
        }
    }
}

impl ToolState {
    pub fn new(color: [u8; 3], brush_width: u32, eraser_width: u32, opacity: u8) -> Self {
        Self {
            tool: Tool::Brush,
            color,
            brush_width: brush_width.clamp(MIN_WIDTH, MAX_WIDTH),
            eraser_width: eraser_width.clamp(MIN_WIDTH, MAX_WIDTH),
            opacity,
        }
    }

    pub fn select(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn color(&self) -> [u8; 3] { self.color }

    pub fn set_color(&mut self, rgb: [u8; 3]) {
        self.color = rgb;
    }

    /// Set the colour from a hex string; anything unparsable becomes black.
    pub fn set_color_hex(&mut self, hex: &str) {
        self.color = parse_hex_color(hex).unwrap_or([0, 0, 0]);
    }

    pub fn opacity(&self) -> u8 { self.opacity }

    pub fn set_opacity(&mut self, opacity: u8) {
        self.opacity = opacity;
    }

    pub fn brush_width(&self) -> u32 { self.brush_width }

    pub fn eraser_width(&self) -> u32 { self.eraser_width }

    /// Width the size controls currently edit (`None` for fill).
    pub fn active_width(&self) -> Option<u32> {
        match self.tool {
            Tool::Brush | Tool::Shape(_) => Some(self.brush_width),
            Tool::Eraser => Some(self.eraser_width),
            Tool::Fill => None,
        }
    }

    /// Route a size change to the width the current tool uses.
    pub fn set_active_width(&mut self, width: u32) {
        let width = width.clamp(MIN_WIDTH, MAX_WIDTH);
        match self.tool {
            Tool::Brush | Tool::Shape(_) => self.brush_width = width,
            Tool::Eraser => self.eraser_width = width,
            Tool::Fill => {}
        }
    }

    /// Brush colour with the configured opacity as alpha.
    pub fn brush_rgba(&self) -> Rgba<u8> {
        let [r, g, b] = self.color;
        Rgba([r, g, b, self.opacity])
    }

    /// Resolve the current tool into the operation it performs, carrying
    /// only the parameters that operation needs.
    pub fn paint_op(&self) -> PaintOp {
        match self.tool {
            Tool::Brush => PaintOp::Brush { color: self.brush_rgba(), width: self.brush_width },
            Tool::Eraser => PaintOp::Eraser { width: self.eraser_width },
            Tool::Fill => PaintOp::Fill { color: self.brush_rgba() },
            Tool::Shape(kind) => PaintOp::Shape {
                kind,
                color: self.brush_rgba(),
                width: self.brush_width,
            },
        }
    }

    /// Circular size indicator for brush and eraser; hidden for other tools.
    pub fn cursor_ring(&self, center: Point) -> Option<CursorRing> {
        match self.tool {
            Tool::Brush => Some(CursorRing {
                center,
                diameter: self.brush_width as f32,
                color: self.color,
            }),
            Tool::Eraser => Some(CursorRing {
                center,
                diameter: self.eraser_width as f32,
                color: ERASER_CURSOR_COLOR,
            }),
            Tool::Fill | Tool::Shape(_) => None,
        }
    }
}

/// Outline circle drawn under the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorRing {
    pub center: Point,
    pub diameter: f32,
    pub color: [u8; 3],
}

// ============================================================================
// PAINT ENGINE
// ============================================================================

/// A fully-resolved painting operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintOp {
    Brush { color: Rgba<u8>, width: u32 },
    Eraser { width: u32 },
    Fill { color: Rgba<u8> },
    Shape { kind: ShapeKind, color: Rgba<u8>, width: u32 },
}

impl PaintOp {
    /// Apply the operation to `target` for a pointer moving `from → to`:
    /// brush/eraser paint the segment, fill seeds at `to`, shapes draw the
    /// outline spanned by the two points.
    pub fn apply(&self, target: &mut RgbaImage, from: Point, to: Point) {
        match *self {
            PaintOp::Brush { color, width } => {
                raster::stroke_segment(target, from, to, width as f32, color);
            }
            PaintOp::Eraser { width } => {
                raster::stroke_segment(target, from, to, width as f32, TRANSPARENT);
            }
            PaintOp::Fill { color } => {
                raster::flood_fill(target, to, color);
            }
            PaintOp::Shape { kind, color, width } => {
                let path = kind.path(from, to);
                raster::stroke_polyline(target, &path.points, path.closed, width as f32, color);
            }
        }
    }
}
