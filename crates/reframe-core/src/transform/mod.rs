//! Crop transform: pan, zoom, preview and export.
//!
//! This module places a source image under a fixed square crop mask and maps
//! what the mask shows onto a higher-resolution square export.
//!
//! # Pipeline
//!
//! 1. `ScaleBounds` derives the zoom range from image and mask size
//! 2. `ViewTransform` holds scale and offset in display (canvas) pixels
//! 3. `CropEngine` renders the preview, or re-renders the same view on an
//!    offscreen surface with scale and offset multiplied by
//!    `output_size / mask_size`
//!
//! # Coordinate System
//!
//! - The image center sits at the canvas center plus `offset`
//! - Scale is display pixels per image pixel
//! - Origin is top-left corner, y grows downward

mod engine;
mod render;
mod view;

pub use engine::{CropEngine, RenderError};
pub use view::{cover_scale, ScaleBounds, ViewTransform};
