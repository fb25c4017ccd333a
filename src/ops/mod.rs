pub mod raster;
pub mod shapes;

/// Canvas-space position in pixels (x right, y down).
pub type Point = (f32, f32);
