//! Core types for source image loading.

use image::RgbaImage;
use thiserror::Error;

/// MIME type for PNG rasters.
pub const MIME_PNG: &str = "image/png";
/// MIME type for JPEG rasters.
pub const MIME_JPEG: &str = "image/jpeg";

/// Error types for loading a source image.
///
/// A `LoadError` is always raised before any engine state exists, so a failed
/// load never leaves a half-initialized engine behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The bytes are not in a recognized or supported image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image header was recognized but the data could not be decoded.
    #[error("Corrupted or incomplete image file: {0}")]
    Corrupted(String),

    /// The image decoded to zero width or height.
    #[error("Image has no pixels")]
    EmptyImage,

    /// The decoded image exceeds the configured pixel budget.
    #[error("Image too large: {width}x{height} exceeds {max_pixels} pixels")]
    TooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    /// A data URL could not be parsed.
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// An opaque encoded raster (PNG, JPEG, ...) together with its MIME type.
///
/// This is the artifact that flows between the crop export, the external edit
/// collaborator and the edit history. It is never mutated once created; share it
/// with `Arc<EncodedImage>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded file bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes` (e.g. `image/png`).
    pub mime_type: String,
}

impl EncodedImage {
    /// Create an encoded image from bytes and a MIME type.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Wrap raw bytes, detecting the MIME type from the content.
    pub fn sniff(bytes: Vec<u8>) -> Result<Self, LoadError> {
        let format = image::guess_format(&bytes).map_err(|_| LoadError::InvalidFormat)?;
        Ok(Self {
            bytes,
            mime_type: format.to_mime_type().to_string(),
        })
    }

    /// Size of the encoded payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A decoded source image ready to be shown in the crop engine.
///
/// Pixels are stored as straight (non-premultiplied) RGBA so that transparent
/// sources can be composited over the configured background on export.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
    mime_type: String,
}

impl SourceImage {
    /// Create a source image from decoded pixels and the MIME type they came from.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::EmptyImage` if the raster has zero width or height.
    pub fn new(pixels: RgbaImage, mime_type: impl Into<String>) -> Result<Self, LoadError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(LoadError::EmptyImage);
        }
        Ok(Self {
            pixels,
            mime_type: mime_type.into(),
        })
    }

    /// Intrinsic width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Intrinsic height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// MIME type of the encoding this image was decoded from.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Borrow the RGBA pixel buffer.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
