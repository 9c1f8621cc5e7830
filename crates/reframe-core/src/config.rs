//! Crop engine configuration.
//!
//! `CropConfig` gathers every tunable of the crop engine: canvas and mask
//! geometry, export resolution, zoom bounds, colors and resource budgets.
//! `Default` reproduces the stock cropper (600x500 canvas, 300px mask,
//! 1024px export). The struct deserializes with `#[serde(default)]`, so a
//! partial JS object only overrides the fields it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for invalid configuration values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("mask size must be positive")]
    ZeroMask,

    #[error("mask size {mask} does not fit in a {width}x{height} canvas")]
    MaskExceedsCanvas { mask: u32, width: u32, height: u32 },

    #[error("output size must be positive")]
    ZeroOutput,

    #[error("invalid zoom limit: {0:?}")]
    InvalidZoomLimit(ZoomLimit),

    #[error("JPEG quality must be within 1..=100, got {0}")]
    InvalidJpegQuality(u8),

    #[error("invalid color {0:?}: expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    #[error("export background must be opaque, got {0}")]
    TranslucentExportBackground(String),
}

/// Upper bound on zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ZoomLimit {
    /// Maximum scale is this multiple of the minimum (cover) scale.
    Relative(f64),
    /// Maximum scale is this absolute factor, but never below the minimum scale.
    Absolute(f64),
}

impl Default for ZoomLimit {
    fn default() -> Self {
        ZoomLimit::Relative(4.0)
    }
}

impl ZoomLimit {
    /// Resolve the maximum scale for a given minimum scale.
    pub fn max_scale(self, min_scale: f64) -> f64 {
        match self {
            ZoomLimit::Relative(factor) => min_scale * factor,
            ZoomLimit::Absolute(ceiling) => ceiling.max(min_scale),
        }
    }

    fn is_valid(self) -> bool {
        match self {
            ZoomLimit::Relative(factor) => factor.is_finite() && factor >= 1.0,
            ZoomLimit::Absolute(ceiling) => ceiling.is_finite() && ceiling > 0.0,
        }
    }
}

/// An RGBA color with straight alpha.
///
/// Serialized as a CSS-style hex string (`#rrggbb` or `#rrggbbaa`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from RGBA components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !(digits.len() == 6 || digits.len() == 8)
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Crop engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropConfig {
    /// Preview canvas backing width in pixels.
    pub canvas_width: u32,
    /// Preview canvas backing height in pixels.
    pub canvas_height: u32,
    /// Side of the square crop mask, in canvas pixels.
    pub mask_size: u32,
    /// Side of the square export raster.
    pub output_size: u32,
    /// Upper bound on zoom.
    pub zoom_limit: ZoomLimit,
    /// Fill behind the image in the preview.
    pub preview_background: Color,
    /// Fill composited beneath the image on export.
    pub export_background: Color,
    /// Overlay drawn outside the mask in the preview.
    pub dim_color: Color,
    /// Mask border stroke color.
    pub border_color: Color,
    /// Mask border stroke width in canvas pixels (0 disables the border).
    pub border_width: u32,
    /// Draw rule-of-thirds guides inside the mask.
    pub show_guides: bool,
    /// Guide line color.
    pub guide_color: Color,
    /// Quality used when the export is encoded as JPEG.
    pub jpeg_quality: u8,
    /// Largest source raster (width * height) accepted on load.
    pub max_source_pixels: u64,
    /// Largest export surface (width * height) that will be allocated.
    pub max_output_pixels: u64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600,
            canvas_height: 500,
            mask_size: 300,
            output_size: 1024,
            zoom_limit: ZoomLimit::default(),
            preview_background: Color::rgb(0x0f, 0x17, 0x2a),
            export_background: Color::WHITE,
            dim_color: Color::rgba(0, 0, 0, 179),
            border_color: Color::rgb(0xf9, 0x73, 0x16),
            border_width: 2,
            show_guides: false,
            guide_color: Color::rgba(0xff, 0xff, 0xff, 96),
            jpeg_quality: 92,
            max_source_pixels: 40_000_000,
            max_output_pixels: 64_000_000,
        }
    }
}

impl CropConfig {
    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mask_size == 0 {
            return Err(ConfigError::ZeroMask);
        }
        if self.mask_size > self.canvas_width || self.mask_size > self.canvas_height {
            return Err(ConfigError::MaskExceedsCanvas {
                mask: self.mask_size,
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if self.output_size == 0 {
            return Err(ConfigError::ZeroOutput);
        }
        if !self.zoom_limit.is_valid() {
            return Err(ConfigError::InvalidZoomLimit(self.zoom_limit));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }
        if self.export_background.a != 255 {
            return Err(ConfigError::TranslucentExportBackground(
                self.export_background.to_hex(),
            ));
        }
        Ok(())
    }

    /// Display-to-export ratio for an output size: `output_size / mask_size`.
    pub fn ratio(&self, output_size: u32) -> f64 {
        f64::from(output_size) / f64::from(self.mask_size)
    }

    /// Canvas center in backing pixels.
    pub fn canvas_center(&self) -> (f64, f64) {
        (
            f64::from(self.canvas_width) / 2.0,
            f64::from(self.canvas_height) / 2.0,
        )
    }

    /// Mask rectangle `(x, y, size)` in canvas pixels, centered in the canvas.
    pub fn mask_rect(&self) -> (f64, f64, f64) {
        let size = f64::from(self.mask_size);
        (
            (f64::from(self.canvas_width) - size) / 2.0,
            (f64::from(self.canvas_height) - size) / 2.0,
            size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CropConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mask_rect(), (150.0, 100.0, 300.0));
        assert_eq!(config.canvas_center(), (300.0, 250.0));
    }

    #[test]
    fn test_ratio() {
        let mut config = CropConfig::default();
        config.mask_size = 500;
        assert!((config.ratio(1024) - 2.048).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CropConfig::default();
        config.mask_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMask));

        let mut config = CropConfig::default();
        config.mask_size = 501;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaskExceedsCanvas { .. })
        ));

        let mut config = CropConfig::default();
        config.output_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroOutput));

        let mut config = CropConfig::default();
        config.zoom_limit = ZoomLimit::Relative(0.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidZoomLimit(_))
        ));

        let mut config = CropConfig::default();
        config.zoom_limit = ZoomLimit::Absolute(f64::NAN);
        assert!(config.validate().is_err());

        let mut config = CropConfig::default();
        config.jpeg_quality = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidJpegQuality(0)));

        let mut config = CropConfig::default();
        config.export_background = Color::rgba(255, 255, 255, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TranslucentExportBackground(_))
        ));
    }

    #[test]
    fn test_zoom_limit_max_scale() {
        assert_eq!(ZoomLimit::Relative(4.0).max_scale(0.5), 2.0);
        assert_eq!(ZoomLimit::Absolute(3.0).max_scale(0.5), 3.0);
        // Absolute ceiling never drops below the cover scale
        assert_eq!(ZoomLimit::Absolute(0.2).max_scale(0.5), 0.5);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#0f172a").unwrap(), Color::rgb(15, 23, 42));
        assert_eq!(
            Color::from_hex("#000000b3").unwrap(),
            Color::rgba(0, 0, 0, 179)
        );
        assert_eq!(Color::rgb(0xf9, 0x73, 0x16).to_hex(), "#f97316");
        assert_eq!(Color::rgba(0, 0, 0, 179).to_hex(), "#000000b3");

        assert!(Color::from_hex("0f172a").is_err());
        assert!(Color::from_hex("#0f17").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }
}
