//! Interactive crop engine.
//!
//! `CropEngine` owns one decoded image and the view transform that places it
//! under a fixed square mask. It renders the interactive preview and exports
//! the masked region at a higher output resolution.
//!
//! # Coordinate System
//!
//! - Offsets are in canvas backing pixels, relative to the canvas center
//! - Scale is canvas pixels per image pixel
//! - On export, both are multiplied by `ratio = output_size / mask_size`

use image::{DynamicImage, RgbImage, RgbaImage};
use thiserror::Error;

use super::render;
use super::{ScaleBounds, ViewTransform};
use crate::config::{ConfigError, CropConfig};
use crate::decode::{decode_source, EncodedImage, LoadError, SourceImage};
use crate::encode::{encode_rgb, EncodeError, ExportFormat};

/// Errors raised while producing an export.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The offscreen surface could not be allocated (zero size, over the
    /// configured pixel budget, or out of memory).
    #[error("Cannot allocate a {width}x{height} export surface")]
    SurfaceAllocation { width: u32, height: u32 },

    /// The composited raster could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Crop engine for one loaded image.
#[derive(Debug, Clone)]
pub struct CropEngine {
    config: CropConfig,
    image: SourceImage,
    bounds: ScaleBounds,
    view: ViewTransform,
}

impl CropEngine {
    /// Create an engine showing `image`, initialized to the cover scale.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `config` fails validation.
    pub fn new(image: SourceImage, config: CropConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bounds = ScaleBounds::for_image(
            image.width(),
            image.height(),
            config.mask_size,
            config.zoom_limit,
        );
        log::debug!(
            "crop engine initialized: {}x{} image, scale range [{:.4}, {:.4}]",
            image.width(),
            image.height(),
            bounds.min,
            bounds.max
        );
        Ok(Self {
            config,
            image,
            bounds,
            view: ViewTransform::centered(bounds.min),
        })
    }

    /// Replace the shown image and reset the view to the cover scale.
    pub fn initialize(&mut self, image: SourceImage) {
        self.image = image;
        self.reset();
        log::debug!(
            "crop engine reinitialized: {}x{} image",
            self.image.width(),
            self.image.height()
        );
    }

    /// Decode `bytes` and show the result.
    ///
    /// Decoding finishes before anything is replaced, so on error the engine
    /// keeps its previous image and view.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        let image = decode_source(bytes, self.config.max_source_pixels)?;
        self.initialize(image);
        Ok(())
    }

    /// Set the zoom, clamped into `[min_scale, max_scale]`. Returns the applied scale.
    pub fn set_scale(&mut self, value: f64) -> f64 {
        self.view = self.view.with_scale(value, self.bounds);
        self.view.scale
    }

    /// Move the image by `(dx, dy)` canvas pixels. Offsets are never clamped,
    /// so the image may leave the mask entirely. Non-finite deltas are ignored.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.view = self.view.panned(dx, dy);
    }

    /// Place the image center at `(x, y)` relative to the canvas center.
    /// Non-finite coordinates are ignored.
    pub fn set_offset(&mut self, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        self.view = self.view.with_offset(x, y);
    }

    /// Recompute the scale range and return to the centered cover view.
    pub fn reset(&mut self) {
        self.bounds = ScaleBounds::for_image(
            self.image.width(),
            self.image.height(),
            self.config.mask_size,
            self.config.zoom_limit,
        );
        self.view = ViewTransform::centered(self.bounds.min);
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn bounds(&self) -> ScaleBounds {
        self.bounds
    }

    pub fn min_scale(&self) -> f64 {
        self.bounds.min
    }

    pub fn max_scale(&self) -> f64 {
        self.bounds.max
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn image(&self) -> &SourceImage {
        &self.image
    }

    /// Whether the image covers every pixel of the mask under the current view.
    pub fn covers_mask(&self) -> bool {
        let (mask_x, mask_y, size) = self.config.mask_rect();
        let (left, top, right, bottom) = self.view.image_rect(
            self.image.width(),
            self.image.height(),
            self.config.canvas_center(),
        );
        const EPS: f64 = 1e-9;
        left <= mask_x + EPS
            && top <= mask_y + EPS
            && right >= mask_x + size - EPS
            && bottom >= mask_y + size - EPS
    }

    /// Allocate a blank surface sized to the configured canvas.
    pub fn preview_surface(&self) -> RgbaImage {
        RgbaImage::new(self.config.canvas_width, self.config.canvas_height)
    }

    /// Draw the preview onto `surface`.
    ///
    /// The mask is centered in the surface, so `surface` is expected to have
    /// the canvas backing size. Only the surface is modified.
    pub fn render_preview(&self, surface: &mut RgbaImage) {
        let config = &self.config;
        let (width, height) = (f64::from(surface.width()), f64::from(surface.height()));
        let center = (width / 2.0, height / 2.0);

        render::fill(surface, config.preview_background);
        render::draw_image(surface, self.image.pixels(), center, self.view);

        // Dim everything outside the mask
        let size = f64::from(config.mask_size);
        let mask_x = (width - size) / 2.0;
        let mask_y = (height - size) / 2.0;
        let (mask_right, mask_bottom) = (mask_x + size, mask_y + size);
        render::fill_rect(surface, 0.0, 0.0, width, mask_y, config.dim_color);
        render::fill_rect(surface, 0.0, mask_bottom, width, height, config.dim_color);
        render::fill_rect(surface, 0.0, mask_y, mask_x, mask_bottom, config.dim_color);
        render::fill_rect(surface, mask_right, mask_y, width, mask_bottom, config.dim_color);

        if config.show_guides {
            for third in [1.0, 2.0] {
                let x = (mask_x + size * third / 3.0).floor();
                let y = (mask_y + size * third / 3.0).floor();
                render::fill_rect(surface, x, mask_y, x + 1.0, mask_bottom, config.guide_color);
                render::fill_rect(surface, mask_x, y, mask_right, y + 1.0, config.guide_color);
            }
        }

        render::stroke_rect(
            surface,
            mask_x,
            mask_y,
            size,
            f64::from(config.border_width),
            config.border_color,
        );
    }

    /// Render the preview into a new canvas-sized surface.
    pub fn render_preview_image(&self) -> RgbaImage {
        let mut surface = self.preview_surface();
        self.render_preview(&mut surface);
        surface
    }

    /// Composite the masked region at `output_size x output_size`.
    ///
    /// Identical image, view, mask size and output size always produce
    /// identical pixels.
    pub fn export_raster(&self, output_size: u32) -> Result<RgbImage, RenderError> {
        let mut surface = allocate_surface(output_size, self.config.max_output_pixels)?;
        render::fill(&mut surface, self.config.export_background);

        let half = f64::from(output_size) / 2.0;
        let view = self.view.scaled_by(self.config.ratio(output_size));
        render::draw_image(&mut surface, self.image.pixels(), (half, half), view);

        Ok(DynamicImage::ImageRgba8(surface).into_rgb8())
    }

    /// Export and encode the masked region.
    ///
    /// JPEG sources export as JPEG; all others export as PNG.
    pub fn export_crop(&self, output_size: u32) -> Result<EncodedImage, RenderError> {
        let raster = self.export_raster(output_size)?;
        let format = ExportFormat::for_source_mime(self.image.mime_type());
        let encoded = encode_rgb(
            raster.as_raw(),
            output_size,
            output_size,
            format,
            self.config.jpeg_quality,
        )?;
        log::debug!(
            "exported {output_size}x{output_size} crop as {} ({} bytes)",
            encoded.mime_type,
            encoded.len()
        );
        Ok(encoded)
    }

    /// Export at the configured output size.
    pub fn export_default(&self) -> Result<EncodedImage, RenderError> {
        self.export_crop(self.config.output_size)
    }
}

/// Allocate a square RGBA surface, reporting failure instead of aborting.
fn allocate_surface(size: u32, max_pixels: u64) -> Result<RgbaImage, RenderError> {
    let error = || RenderError::SurfaceAllocation {
        width: size,
        height: size,
    };

    let pixels = u64::from(size) * u64::from(size);
    if size == 0 || pixels > max_pixels {
        return Err(error());
    }
    let len = usize::try_from(pixels * 4).map_err(|_| error())?;

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| error())?;
    buffer.resize(len, 0u8);
    RgbaImage::from_raw(size, size, buffer).ok_or_else(error)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::ZoomLimit;
    use crate::decode::MIME_PNG;
    use image::Rgba;
    use proptest::prelude::*;

    fn pattern_image(width: u32, height: u32) -> SourceImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        SourceImage::new(img, MIME_PNG).unwrap()
    }

    fn small_config(mask_size: u32) -> CropConfig {
        let mut config = CropConfig::default();
        config.canvas_width = 64;
        config.canvas_height = 64;
        config.mask_size = mask_size;
        config.zoom_limit = ZoomLimit::Relative(4.0);
        config
    }

    proptest! {
        /// Property: Applied scale always lies in [min_scale, max_scale].
        #[test]
        fn prop_set_scale_in_bounds(
            (width, height) in (1u32..=400, 1u32..=400),
            requested in prop_oneof![
                any::<f64>(),
                -10.0f64..10.0,
                Just(f64::NAN),
                Just(f64::INFINITY),
            ],
        ) {
            let mut engine =
                CropEngine::new(pattern_image(width, height), small_config(32)).unwrap();
            let applied = engine.set_scale(requested);

            prop_assert!(applied >= engine.min_scale());
            prop_assert!(applied <= engine.max_scale());
            prop_assert_eq!(applied, engine.view().scale);
        }

        /// Property: The cover scale always covers the mask when centered.
        #[test]
        fn prop_cover_scale_covers_mask(
            (width, height) in (1u32..=96, 1u32..=96),
            mask in 1u32..=64,
        ) {
            let engine = CropEngine::new(pattern_image(width, height), small_config(mask)).unwrap();
            prop_assert!(engine.covers_mask());
        }

        /// Property: Export is deterministic for identical state.
        #[test]
        fn prop_export_is_deterministic(
            (width, height) in (4u32..=40, 4u32..=40),
            mask in 8u32..=64,
            scale in 0.0f64..10.0,
            (dx, dy) in (-50.0f64..50.0, -50.0f64..50.0),
            output in 8u32..=48,
        ) {
            let mut engine =
                CropEngine::new(pattern_image(width, height), small_config(mask)).unwrap();
            engine.set_scale(scale);
            engine.pan(dx, dy);

            let first = engine.export_raster(output).unwrap();
            let second = engine.clone().export_raster(output).unwrap();
            prop_assert_eq!(first.as_raw(), second.as_raw());

            let encoded_a = engine.export_crop(output).unwrap();
            let encoded_b = engine.export_crop(output).unwrap();
            prop_assert_eq!(encoded_a, encoded_b);
        }
    }
}
