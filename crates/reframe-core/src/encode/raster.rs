//! PNG and JPEG encoding for crop export.
//!
//! Uses the `image` crate's encoders. The export surface is always opaque
//! (the background is composited underneath), so rasters are encoded as RGB.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

use crate::decode::{EncodedImage, MIME_JPEG, MIME_PNG};

/// Errors that can occur during encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format:?} encoding failed: {message}")]
    EncodingFailed {
        format: ExportFormat,
        message: String,
    },
}

/// Output encoding for an exported crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG at the configured quality.
    Jpeg,
}

impl ExportFormat {
    /// Pick the export format that preserves a source encoding.
    ///
    /// JPEG sources stay JPEG; everything else (PNG, WebP, unknown) exports as PNG.
    pub fn for_source_mime(mime_type: &str) -> Self {
        if mime_type.eq_ignore_ascii_case(MIME_JPEG) || mime_type.eq_ignore_ascii_case("image/jpg")
        {
            ExportFormat::Jpeg
        } else {
            ExportFormat::Png
        }
    }

    /// MIME type of this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => MIME_PNG,
            ExportFormat::Jpeg => MIME_JPEG,
        }
    }
}

/// Encode RGB pixel data to the given format.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `format` - Output encoding
/// * `jpeg_quality` - JPEG quality (1-100); ignored for PNG
///
/// # Returns
///
/// The encoded bytes tagged with the format's MIME type.
pub fn encode_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: ExportFormat,
    jpeg_quality: u8,
) -> Result<EncodedImage, EncodeError> {
    // Validate dimensions
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    // Validate pixel data length
    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());

    let result = match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut buffer).write_image(pixels, width, height, ExtendedColorType::Rgb8)
        }
        ExportFormat::Jpeg => {
            let quality = jpeg_quality.clamp(1, 100);
            JpegEncoder::new_with_quality(&mut buffer, quality).write_image(
                pixels,
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
    };
    result.map_err(|e| EncodeError::EncodingFailed {
        format,
        message: e.to_string(),
    })?;

    Ok(EncodedImage::new(buffer.into_inner(), format.mime_type()))
}


// ============================================================================
// Property-Based Tests
// ============================================================================
