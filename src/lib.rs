//! Layered drawing canvas for a diary: one flattened PNG per day, painted
//! with brush, eraser, fill and shape tools over a stack of RGBA layers.

#[macro_use]
pub mod logger;
pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod controller;
pub mod io;
pub mod ops;
pub mod session;
pub mod settings;
