use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use rayon::prelude::*;

pub const BACKGROUND_LAYER_NAME: &str = "Background";
pub const LOADED_LAYER_NAME: &str = "Loaded Drawing";

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Resampling filter used whenever a buffer has to change size.
const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

// ============================================================================
// LAYER
// ============================================================================

/// One named, independently paintable RGBA buffer (straight alpha).
#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub pixels: RgbaImage,
}

impl Layer {
    /// Fully transparent layer.
    pub fn new(name: String, width: u32, height: u32) -> Self {
        Self {
            name,
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn from_image(name: String, pixels: RgbaImage) -> Self {
        Self { name, pixels }
    }
}

/// Direction for [`LayerStack::move_active`].  `Up` moves toward the top of
/// the stack (index 0), `Down` toward the bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerMove {
    Up,
    Down,
}

// ============================================================================
// LAYER STACK
// ============================================================================

/// Ordered layer store.  Index 0 is the topmost layer when compositing.
///
/// Invariants held after every public call:
/// * the stack is never empty,
/// * `active_layer_index < layers.len()`,
/// * every layer buffer is exactly `width × height`.
#[derive(Clone, Debug)]
pub struct LayerStack {
    layers: Vec<Layer>,
    active_layer_index: usize,
    width: u32,
    height: u32,
}

impl LayerStack {
    /// A stack holding one blank "Background" layer.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = sanitize_dimensions(width, height);
        Self {
            layers: vec![Layer::new(BACKGROUND_LAYER_NAME.to_string(), width, height)],
            active_layer_index: 0,
            width,
            height,
        }
    }

    /// A stack wrapping an existing image as its sole layer.  The canvas
    /// takes the image's dimensions.
    pub fn from_image(name: &str, image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            crate::log_warn!("LayerStack::from_image: empty image, starting blank");
            return Self::new(1, 1);
        }
        Self {
            layers: vec![Layer::from_image(name.to_string(), image)],
            active_layer_index: 0,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn len(&self) -> usize { self.layers.len() }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool { self.layers.is_empty() }

    pub fn layers(&self) -> &[Layer] { &self.layers }

    pub fn active_index(&self) -> usize { self.active_layer_index }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active_layer_index]
    }

    /// Mutable access to the active layer's buffer.  Callers may change pixel
    /// values but not dimensions (the buffer is handed out by reference only).
    pub fn active_pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.layers[self.active_layer_index].pixels
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Insert a layer at the active position (directly above the previously
    /// active layer) and make it active.  With no name the layer is called
    /// "Layer N"; with no image it is fully transparent.
    pub fn add_layer(&mut self, name: Option<String>, image: Option<RgbaImage>) {
        let name = name.unwrap_or_else(|| format!("Layer {}", self.layers.len() + 1));
        let pixels = match image {
            Some(img) => self.fit_to_canvas(img),
            None => RgbaImage::from_pixel(self.width, self.height, TRANSPARENT),
        };
        let insert_index = self.active_layer_index.min(self.layers.len());
        crate::log_info!("Added layer '{}' at index {}", name, insert_index);
        self.layers.insert(insert_index, Layer::from_image(name, pixels));
        self.active_layer_index = insert_index;
    }

    /// Delete the active layer.  Removing the last remaining layer leaves a
    /// fresh blank "Background" layer behind.
    pub fn remove_layer(&mut self) {
        let removed = self.layers.remove(self.active_layer_index);
        crate::log_info!("Removed layer '{}'", removed.name);
        if self.layers.is_empty() {
            self.layers.push(Layer::new(
                BACKGROUND_LAYER_NAME.to_string(),
                self.width,
                self.height,
            ));
        }
        if self.active_layer_index >= self.layers.len() {
            self.active_layer_index = self.layers.len() - 1;
        }
    }

    /// Swap the active layer with its neighbour.  Returns false at the
    /// boundary (nothing moved).
    pub fn move_active(&mut self, direction: LayerMove) -> bool {
        let idx = self.active_layer_index;
        let target = match direction {
            LayerMove::Up if idx > 0 => idx - 1,
            LayerMove::Down if idx + 1 < self.layers.len() => idx + 1,
            _ => return false,
        };
        self.layers.swap(idx, target);
        self.active_layer_index = target;
        true
    }

    /// Select a layer.  Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.layers.len() {
            self.active_layer_index = index;
            true
        } else {
            false
        }
    }

    /// Resample every layer to the new canvas size in lockstep.
    pub fn resize_all(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            crate::log_warn!("Ignoring resize to {}×{}", width, height);
            return;
        }
        if (width, height) == (self.width, self.height) {
            return;
        }
        crate::log_info!(
            "Resizing {} layer(s) {}×{} -> {}×{}",
            self.layers.len(), self.width, self.height, width, height
        );
        self.layers.par_iter_mut().for_each(|layer| {
            layer.pixels = imageops::resize(&layer.pixels, width, height, RESAMPLE_FILTER);
        });
        self.width = width;
        self.height = height;
    }

    /// Make every pixel of the active layer fully transparent.
    pub fn clear_active(&mut self) {
        crate::ops::raster::clear(self.active_pixels_mut());
    }

    /// Swap the active layer's buffer for `pixels` and return the previous
    /// buffer.  `pixels` is resampled first if its size differs from the canvas.
    pub fn replace_active_pixels(&mut self, pixels: RgbaImage) -> RgbaImage {
        let pixels = self.fit_to_canvas(pixels);
        std::mem::replace(&mut self.layers[self.active_layer_index].pixels, pixels)
    }

    fn fit_to_canvas(&self, image: RgbaImage) -> RgbaImage {
        if image.dimensions() == (self.width, self.height) {
            return image;
        }
        crate::log_warn!(
            "Resampling {}×{} buffer to canvas size {}×{}",
            image.width(), image.height(), self.width, self.height
        );
        imageops::resize(&image, self.width, self.height, RESAMPLE_FILTER)
    }

    // ---- compositing --------------------------------------------------------

    /// Composite the stack over an opaque white canvas.
    pub fn composite(&self) -> RgbaImage {
        let base = RgbaImage::from_pixel(self.width, self.height, WHITE);
        composite_onto(base, &self.layers)
    }

    /// Composite and drop the alpha channel, for persistence.
    pub fn flatten(&self) -> RgbImage {
        DynamicImage::ImageRgba8(self.composite()).to_rgb8()
    }
}

/// Clamp degenerate canvas sizes to 1×1.
fn sanitize_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        crate::log_warn!("Canvas dimensions {}×{} are empty, clamped to 1×1", width, height);
        (1, 1)
    } else {
        (width, height)
    }
}

// ============================================================================
// COMPOSITOR
// ============================================================================

/// Blend `layers` over `base`, bottom (last) to top (first).  Rows are
/// processed in parallel.  Layers whose size differs from `base` are skipped.
///
/// Because each layer is applied to the running result, compositing
/// `[A, B, C]` over `base` equals compositing `[A]` over the cached result
/// of `[B, C]` over `base`.
pub fn composite_onto(mut base: RgbaImage, layers: &[Layer]) -> RgbaImage {
    let dims = base.dimensions();
    let row_len = dims.0 as usize * 4;
    if row_len == 0 {
        return base;
    }
    let dst: &mut [u8] = &mut base;
    for layer in layers.iter().rev() {
        if layer.pixels.dimensions() != dims {
            crate::log_warn!("composite: skipping layer '{}' with mismatched size", layer.name);
            continue;
        }
        let src: &[u8] = layer.pixels.as_raw();
        dst.par_chunks_mut(row_len)
            .zip(src.par_chunks(row_len))
            .for_each(|(dst_row, src_row)| {
                for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                    if s[3] == 0 {
                        continue;
                    }
                    let out = blend_pixel(
                        Rgba([d[0], d[1], d[2], d[3]]),
                        Rgba([s[0], s[1], s[2], s[3]]),
                    );
                    d.copy_from_slice(&out.0);
                }
            });
    }
    base
}

/// Straight-alpha "over": `top` drawn on top of `base`.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    // Fast paths: fully transparent or fully opaque top pixel
    if top[3] == 0 {
        return base;
    }
    if top[3] == 255 {
        return top;
    }

    let top_a = top[3] as f32 / 255.0;
    let base_a = base[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let t = top[c] as f32 / 255.0;
        let b = base[c] as f32 / 255.0;
        let v = (t * top_a + b * base_a * (1.0 - top_a)) / out_a;
        out[c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(color))
    }

    fn assert_invariants(stack: &LayerStack) {
        assert!(stack.len() > 0);
        assert!(stack.active_index() < stack.len());
        for layer in stack.layers() {
            assert_eq!(layer.pixels.dimensions(), (stack.width(), stack.height()));
        }
    }

    #[test]
    fn new_stack_has_blank_background() {
        let stack = LayerStack::new(8, 4);
        assert_eq!(stack.layer_names(), vec!["Background"]);
        assert!(stack.active_layer().pixels.pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn zero_sized_canvas_is_clamped() {
        let stack = LayerStack::new(0, 10);
        assert_eq!((stack.width(), stack.height()), (1, 1));
    }

    #[test]
    fn add_layer_inserts_at_active_and_names_by_count() {
        let mut stack = LayerStack::new(4, 4);
        stack.add_layer(None, None);
        assert_eq!(stack.layer_names(), vec!["Layer 2", "Background"]);
        assert_eq!(stack.active_index(), 0);

        stack.set_active(1);
        stack.add_layer(Some("Sketch".into()), None);
        assert_eq!(stack.layer_names(), vec!["Layer 2", "Sketch", "Background"]);
        assert_eq!(stack.active_index(), 1);
    }

    #[test]
    fn added_image_is_resampled_to_canvas() {
        let mut stack = LayerStack::new(10, 6);
        stack.add_layer(Some("big".into()), Some(solid(20, 12, [1, 2, 3, 255])));
        assert_invariants(&stack);
        assert_eq!(*stack.active_layer().pixels.get_pixel(5, 3), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn removing_last_layer_synthesizes_background() {
        let mut stack = LayerStack::new(4, 4);
        stack.active_pixels_mut().put_pixel(0, 0, Rgba([9, 9, 9, 255]));
        stack.remove_layer();
        assert_eq!(stack.layer_names(), vec!["Background"]);
        assert_eq!(*stack.active_layer().pixels.get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn remove_clamps_active_to_last_index() {
        let mut stack = LayerStack::new(4, 4);
        stack.add_layer(None, None);
        stack.add_layer(None, None);
        stack.set_active(2);
        stack.remove_layer();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.active_index(), 1);
    }

    #[test]
    fn move_active_is_a_no_op_at_boundaries() {
        let mut stack = LayerStack::new(4, 4);
        stack.add_layer(Some("top".into()), None);
        assert!(!stack.move_active(LayerMove::Up));
        assert!(stack.move_active(LayerMove::Down));
        assert_eq!(stack.layer_names(), vec!["Background", "top"]);
        assert_eq!(stack.active_index(), 1);
        assert!(!stack.move_active(LayerMove::Down));
    }

    #[test]
    fn set_active_ignores_out_of_range() {
        let mut stack = LayerStack::new(4, 4);
        assert!(!stack.set_active(3));
        assert_eq!(stack.active_index(), 0);
    }

    #[test]
    fn invariants_hold_across_mixed_operations() {
        let mut stack = LayerStack::new(6, 6);
        // Deterministic pseudo-random operation sequence
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            match (seed >> 16) % 5 {
                0 => stack.add_layer(None, None),
                1 => stack.remove_layer(),
                2 => { stack.move_active(LayerMove::Up); }
                3 => { stack.move_active(LayerMove::Down); }
                _ => { stack.set_active(((seed >> 8) % 7) as usize); }
            }
            assert_invariants(&stack);
        }
    }

    #[test]
    fn resize_all_keeps_layers_in_lockstep() {
        let mut stack = LayerStack::new(10, 10);
        stack.add_layer(None, Some(solid(10, 10, [255, 0, 0, 255])));
        stack.resize_all(20, 5);
        assert_invariants(&stack);
        assert_eq!((stack.width(), stack.height()), (20, 5));
        assert_eq!(*stack.active_layer().pixels.get_pixel(10, 2), Rgba([255, 0, 0, 255]));

        stack.resize_all(0, 5);
        assert_eq!((stack.width(), stack.height()), (20, 5));
    }

    #[test]
    fn clear_active_only_touches_active_layer() {
        let mut stack = LayerStack::new(3, 3);
        stack.add_layer(None, Some(solid(3, 3, [0, 0, 255, 255])));
        stack.add_layer(None, Some(solid(3, 3, [0, 255, 0, 255])));
        stack.clear_active();
        assert!(stack.layers()[0].pixels.pixels().all(|p| *p == TRANSPARENT));
        assert_eq!(*stack.layers()[1].pixels.get_pixel(1, 1), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn blank_stack_composites_to_white() {
        let stack = LayerStack::new(5, 5);
        assert!(stack.composite().pixels().all(|p| *p == WHITE));
        assert!(stack.flatten().pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn top_layer_wins_when_opaque() {
        let mut stack = LayerStack::new(2, 2);
        stack.add_layer(Some("blue".into()), Some(solid(2, 2, [0, 0, 255, 255])));
        stack.add_layer(Some("red".into()), Some(solid(2, 2, [255, 0, 0, 255])));
        assert_eq!(*stack.composite().get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn half_alpha_blends_over_white() {
        let out = blend_pixel(WHITE, Rgba([0, 0, 0, 128]));
        assert_eq!(out[3], 255);
        assert!(out[0] >= 126 && out[0] <= 128, "got {}", out[0]);
    }

    #[test]
    fn blend_over_transparent_keeps_top_color() {
        let out = blend_pixel(TRANSPARENT, Rgba([200, 10, 10, 100]));
        assert_eq!(out, Rgba([200, 10, 10, 100]));
    }

    #[test]
    fn cached_intermediate_composite_matches_full_pass() {
        let a = Layer::from_image("a".into(), solid(3, 3, [255, 0, 0, 90]));
        let b = Layer::from_image("b".into(), solid(3, 3, [0, 255, 0, 170]));
        let c = Layer::from_image("c".into(), solid(3, 3, [0, 0, 255, 40]));
        let white = solid(3, 3, [255, 255, 255, 255]);

        let full = composite_onto(white.clone(), &[a.clone(), b.clone(), c.clone()]);
        let cached = composite_onto(white, &[b, c]);
        let incremental = composite_onto(cached, &[a]);
        assert_eq!(full, incremental);
    }

    #[test]
    fn mismatched_layers_are_skipped() {
        let odd = Layer::from_image("odd".into(), solid(1, 1, [0, 0, 0, 255]));
        let out = composite_onto(solid(2, 2, [255, 255, 255, 255]), &[odd]);
        assert!(out.pixels().all(|p| *p == WHITE));
    }
}
