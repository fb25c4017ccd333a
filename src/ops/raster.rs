//! Raster primitives used by the paint engine.
//!
//! Every write *replaces* the destination pixel with the given RGBA value;
//! alpha blending only happens in the compositor.  All functions are total:
//! coordinates outside the buffer are clipped, never reported as errors.

use image::{Rgba, RgbaImage};

use super::Point;
use crate::canvas::TRANSPARENT;

/// Paint a filled disc of `diameter` pixels centred on `center`.
/// Pixel centres sit on integer coordinates; anything under 1 px still
/// covers the pixel containing the centre.
pub fn stamp_disc(target: &mut RgbaImage, center: Point, diameter: f32, color: Rgba<u8>) {
    let (w, h) = target.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let (cx, cy) = center;
    let r = (diameter * 0.5).max(0.5);
    let r2 = r * r;

    let min_x = (cx - r).floor().max(0.0);
    let min_y = (cy - r).floor().max(0.0);
    let max_x = (cx + r).ceil().min((w - 1) as f32);
    let max_y = (cy + r).ceil().min((h - 1) as f32);
    if min_x > max_x || min_y > max_y {
        return;
    }

    for y in min_y as u32..=max_y as u32 {
        let dy = y as f32 - cy;
        for x in min_x as u32..=max_x as u32 {
            let dx = x as f32 - cx;
            if dx * dx + dy * dy <= r2 {
                target.put_pixel(x, y, color);
            }
        }
    }
}

/// Thick segment from `start` to `end`: discs stamped at ≤1 px spacing, so
/// the ends and joins come out round.  The segment is clipped to the buffer
/// (grown by the stamp radius) first, so far off-canvas endpoints cost no
/// more than on-canvas ones.  Non-finite endpoints paint nothing.
pub fn stroke_segment(target: &mut RgbaImage, start: Point, end: Point, width: f32, color: Rgba<u8>) {
    if ![start.0, start.1, end.0, end.1, width].iter().all(|v| v.is_finite()) {
        return;
    }
    let (w, h) = target.dimensions();
    if w == 0 || h == 0 {
        return;
    }

    let pad = (width * 0.5).max(0.5) + 1.0;
    let min = (-pad, -pad);
    let max = ((w - 1) as f32 + pad, (h - 1) as f32 + pad);
    let Some((start, end)) = clip_segment(start, end, min, max) else { return };

    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance < 0.1 {
        stamp_disc(target, start, width, color);
        return;
    }

    let steps = distance.ceil() as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_disc(target, (start.0 + dx * t, start.1 + dy * t), width, color);
    }
}

/// Liang-Barsky clip of `a → b` against the box `min..=max`.  Returns the
/// visible part, or `None` when the segment misses the box entirely.
fn clip_segment(a: Point, b: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    let edges = [
        (-dx, a.0 - min.0),
        (dx, max.0 - a.0),
        (-dy, a.1 - min.1),
        (dy, max.1 - a.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            // parallel to this edge: either fully outside or unconstrained
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
}

/// Stroke consecutive points; `closed` also joins the last point to the first.
pub fn stroke_polyline(target: &mut RgbaImage, points: &[Point], closed: bool, width: f32, color: Rgba<u8>) {
    match points {
        [] => {}
        [only] => stamp_disc(target, *only, width, color),
        _ => {
            for pair in points.windows(2) {
                stroke_segment(target, pair[0], pair[1], width, color);
            }
            if closed && let (Some(&last), Some(&first)) = (points.last(), points.first()) {
                stroke_segment(target, last, first, width, color);
            }
        }
    }
}

/// Make every pixel fully transparent.
pub fn clear(target: &mut RgbaImage) {
    for pixel in target.pixels_mut() {
        *pixel = TRANSPARENT;
    }
}

/// Exact colour match; all fully transparent pixels count as the same colour
/// whatever their RGB.
#[inline(always)]
fn same_color(p: [u8; 4], target: [u8; 4]) -> bool {
    if p[3] == 0 && target[3] == 0 {
        return true;
    }
    p == target
}

/// Contiguous (4-connected) fill from `seed`, replacing every reachable pixel
/// that has the seed's colour.  Returns the bounding box `(min_x, min_y,
/// max_x, max_y)` of the filled region, or `None` when nothing changed
/// (seed outside the buffer, or the region already has the fill colour).
pub fn flood_fill(target: &mut RgbaImage, seed: Point, color: Rgba<u8>) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = target.dimensions();
    let (sx, sy) = (seed.0.round(), seed.1.round());
    if !(sx >= 0.0 && sy >= 0.0 && sx < w as f32 && sy < h as f32) {
        return None;
    }
    let (start_x, start_y) = (sx as u32, sy as u32);

    let target_color = target.get_pixel(start_x, start_y).0;
    if color.0 == target_color {
        return None;
    }

    let wu = w as usize;
    let flat: &[u8] = target.as_raw();
    #[inline(always)]
    fn pix(flat: &[u8], idx: usize) -> [u8; 4] {
        let o = idx * 4;
        [flat[o], flat[o + 1], flat[o + 2], flat[o + 3]]
    }

    // mask doubles as the visited set and the region to paint
    let mut mask = vec![false; wu * h as usize];
    let seed_idx = start_y as usize * wu + start_x as usize;
    mask[seed_idx] = true;

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (start_x, start_y, start_x, start_y);
    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    stack.push(seed_idx as u32);

    while let Some(idx) = stack.pop() {
        let idx = idx as usize;
        let x = (idx % wu) as u32;
        let y = (idx / wu) as u32;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        let mut visit = |ni: usize| {
            if !mask[ni] && same_color(pix(flat, ni), target_color) {
                mask[ni] = true;
                stack.push(ni as u32);
            }
        };
        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < w {
            visit(idx + 1);
        }
        if y > 0 {
            visit(idx - wu);
        }
        if y + 1 < h {
            visit(idx + wu);
        }
    }

    for (pixel, filled) in target.pixels_mut().zip(mask.iter()) {
        if *filled {
            *pixel = color;
        }
    }
    Some((min_x, min_y, max_x, max_y))
}
