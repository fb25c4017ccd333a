//! Outline geometry for the shape tools.
//!
//! Every shape is described by the two drag endpoints and reduced to a
//! polyline ([`ShapePath`]).  The live preview and the final commit both go
//! through these functions, so what the user sees while dragging is exactly
//! what lands in the layer on release.

use std::f32::consts::{PI, TAU};

use super::Point;

/// Star: vertex count (outer and inner alternate).
pub const STAR_VERTICES: usize = 10;
/// Star: outer radius ÷ inner radius.
pub const STAR_INNER_RATIO: f32 = 2.5;
/// Heart: samples taken over `t ∈ [0, 2π)`.
pub const HEART_SAMPLES: usize = 100;

/// Available shape primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Oval,
    Star,
    Heart,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Oval => "Oval",
            ShapeKind::Star => "Star",
            ShapeKind::Heart => "Heart",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[
            ShapeKind::Line,
            ShapeKind::Rectangle,
            ShapeKind::Oval,
            ShapeKind::Star,
            ShapeKind::Heart,
        ]
    }

    /// Outline for a drag from `start` to `end`.
    pub fn path(self, start: Point, end: Point) -> ShapePath {
        match self {
            ShapeKind::Line => ShapePath::open(vec![start, end]),
            ShapeKind::Rectangle => ShapePath::closed(rectangle_points(start, end)),
            ShapeKind::Oval => ShapePath::closed(oval_points(start, end)),
            ShapeKind::Star => ShapePath::closed(star_points(start, end)),
            ShapeKind::Heart => ShapePath::open(heart_points(start, end)),
        }
    }
}

/// A polyline outline.  `closed` joins the last point back to the first.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapePath {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl ShapePath {
    pub fn open(points: Vec<Point>) -> Self {
        Self { points, closed: false }
    }

    pub fn closed(points: Vec<Point>) -> Self {
        Self { points, closed: true }
    }
}

/// Normalised `(min_x, min_y, max_x, max_y)` of the drag box.
pub fn bounding_box(a: Point, b: Point) -> (f32, f32, f32, f32) {
    (a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
}

fn center_and_size(a: Point, b: Point) -> (Point, f32, f32) {
    let center = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
    (center, (b.0 - a.0).abs(), (b.1 - a.1).abs())
}

pub fn rectangle_points(a: Point, b: Point) -> Vec<Point> {
    let (x0, y0, x1, y1) = bounding_box(a, b);
    vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
}

/// Ellipse inscribed in the drag box, sampled densely enough that segments
/// stay around 2 px long.
pub fn oval_points(a: Point, b: Point) -> Vec<Point> {
    let ((cx, cy), w, h) = center_and_size(a, b);
    let (rx, ry) = (w / 2.0, h / 2.0);
    let samples = ((rx + ry) * PI / 2.0).ceil().clamp(24.0, 720.0) as usize;
    (0..samples)
        .map(|i| {
            let theta = TAU * i as f32 / samples as f32;
            (cx + rx * theta.cos(), cy + ry * theta.sin())
        })
        .collect()
}

/// Five-pointed star inscribed in the drag box, first vertex pointing up.
/// Outer radius is half the box's smaller side; vertices alternate
/// outer/inner every 36°.
pub fn star_points(a: Point, b: Point) -> Vec<Point> {
    let ((cx, cy), w, h) = center_and_size(a, b);
    let outer = w.min(h) / 2.0;
    let inner = outer / STAR_INNER_RATIO;
    (0..STAR_VERTICES)
        .map(|i| {
            let angle = (-90.0 + 36.0 * i as f32).to_radians();
            let radius = if i % 2 == 0 { outer } else { inner };
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// Parametric heart stretched over the drag box:
/// `x = cx + (w/20)·16·sin³t`,
/// `y = cy − (h/20)·(13cos t − 5cos 2t − 2cos 3t − cos 4t)`.
pub fn heart_points(a: Point, b: Point) -> Vec<Point> {
    let ((cx, cy), w, h) = center_and_size(a, b);
    (0..HEART_SAMPLES)
        .map(|i| {
            let t = TAU * i as f32 / HEART_SAMPLES as f32;
            let x = cx + w / 20.0 * (16.0 * t.sin().powi(3));
            let y = cy
                - h / 20.0
                    * (13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos());
            (x, y)
        })
        .collect()
}
