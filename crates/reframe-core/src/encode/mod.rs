//! Image encoding for crop export.
//!
//! This module provides functionality for:
//! - Encoding the composited export surface to PNG or JPEG
//! - Choosing the export format that preserves the source encoding
//!
//! # Examples
//!
//! ```ignore
//! use reframe_core::encode::{encode_rgb, ExportFormat};
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let png = encode_rgb(&pixels, 100, 100, ExportFormat::Png, 92).unwrap();
//! println!("Encoded {} bytes of {}", png.len(), png.mime_type);
//! ```

mod raster;

pub use raster::{encode_rgb, EncodeError, ExportFormat};
