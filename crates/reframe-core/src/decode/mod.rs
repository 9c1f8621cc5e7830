//! Source image loading for Reframe.
//!
//! This module provides functionality for:
//! - Decoding PNG, JPEG and WebP uploads into RGBA rasters
//! - Applying EXIF orientation so the crop engine sees the upright image
//! - Converting encoded images to and from `data:` URLs
//!
//! # Architecture
//!
//! Decoding happens once per image load. The resulting `SourceImage` is
//! immutable and owned by the crop engine showing it. Every failure surfaces
//! as a `LoadError` before any engine state is created.
//!
//! # Examples
//!
//! ```ignore
//! use reframe_core::decode::decode_source;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_source(&bytes, 40_000_000).unwrap();
//! println!("Decoded {}x{} {}", image.width(), image.height(), image.mime_type());
//! ```

mod data_url;
mod source;
mod types;

pub use source::{decode_encoded, decode_source};
pub use types::{EncodedImage, LoadError, Orientation, SourceImage, MIME_JPEG, MIME_PNG};
