//! WASM bindings for the crop engine.
//!
//! `JsCropEngine` backs the cropper component: JS forwards slider and pointer
//! input, draws `render_preview()` with `putImageData`, and calls
//! `export_crop()` when the user confirms.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const engine = new JsCropEngine(bytes, { maskSize: 300, outputSize: 1024 });
//! engine.set_scale(engine.min_scale * 1.5);
//! const rgba = engine.render_preview();
//! ctx.putImageData(new ImageData(new Uint8ClampedArray(rgba), engine.canvas_width), 0, 0);
//! const crop = engine.export_crop();
//! ```

use reframe_core::config::CropConfig;
use reframe_core::decode::decode_source;
use reframe_core::session::SessionError;
use reframe_core::transform::CropEngine;
use wasm_bindgen::prelude::*;

use crate::types::JsEncodedImage;

/// Read a `CropConfig` from a JS object. `undefined` and `null` give the
/// defaults; missing fields keep their defaults.
pub(crate) fn parse_config(value: JsValue) -> Result<CropConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(CropConfig::default());
    }
    let config: CropConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid crop config: {}", e)))?;
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(config)
}

/// Crop engine for one loaded image.
#[wasm_bindgen]
pub struct JsCropEngine {
    inner: CropEngine,
}

#[wasm_bindgen]
impl JsCropEngine {
    /// Decode `bytes` and create an engine at the cover scale.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Encoded PNG, JPEG or WebP
    /// * `config` - Partial `CropConfig` object, or `undefined` for defaults
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: &[u8], config: JsValue) -> Result<JsCropEngine, JsValue> {
        let config = parse_config(config)?;
        Self::with_config(bytes, config).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Replace the image. On error the current image and view are kept.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner
            .load(bytes)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Set the zoom; returns the clamped scale actually applied.
    pub fn set_scale(&mut self, value: f64) -> f64 {
        self.inner.set_scale(value)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.inner.pan(dx, dy);
    }

    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.inner.set_offset(x, y);
    }

    /// Back to the centered cover view.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.view().scale
    }

    #[wasm_bindgen(getter)]
    pub fn offset_x(&self) -> f64 {
        self.inner.view().offset_x
    }

    #[wasm_bindgen(getter)]
    pub fn offset_y(&self) -> f64 {
        self.inner.view().offset_y
    }

    #[wasm_bindgen(getter)]
    pub fn min_scale(&self) -> f64 {
        self.inner.min_scale()
    }

    #[wasm_bindgen(getter)]
    pub fn max_scale(&self) -> f64 {
        self.inner.max_scale()
    }

    #[wasm_bindgen(getter)]
    pub fn image_width(&self) -> u32 {
        self.inner.image().width()
    }

    #[wasm_bindgen(getter)]
    pub fn image_height(&self) -> u32 {
        self.inner.image().height()
    }

    #[wasm_bindgen(getter)]
    pub fn canvas_width(&self) -> u32 {
        self.inner.config().canvas_width
    }

    #[wasm_bindgen(getter)]
    pub fn canvas_height(&self) -> u32 {
        self.inner.config().canvas_height
    }

    #[wasm_bindgen(getter)]
    pub fn covers_mask(&self) -> bool {
        self.inner.covers_mask()
    }

    /// Render the preview as RGBA bytes sized `canvas_width x canvas_height`.
    ///
    /// Note: This copies the surface into JS memory; call it once per change.
    pub fn render_preview(&self) -> Vec<u8> {
        self.inner.render_preview_image().into_raw()
    }

    /// Export the crop at `output_size` (or the configured size).
    pub fn export_crop(&self, output_size: Option<u32>) -> Result<JsEncodedImage, JsValue> {
        self.export(output_size)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl JsCropEngine {
    pub(crate) fn with_config(bytes: &[u8], config: CropConfig) -> Result<Self, SessionError> {
        let image = decode_source(bytes, config.max_source_pixels)?;
        Ok(Self {
            inner: CropEngine::new(image, config)?,
        })
    }

    pub(crate) fn export(&self, output_size: Option<u32>) -> Result<JsEncodedImage, SessionError> {
        let size = output_size.unwrap_or(self.inner.config().output_size);
        let encoded = self.inner.export_crop(size)?;
        Ok(JsEncodedImage::from_encoded(encoded))
    }

    pub(crate) fn inner_mut(&mut self) -> &mut CropEngine {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_core::encode::{encode_rgb, ExportFormat};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![90u8; (width * height * 3) as usize];
        encode_rgb(&pixels, width, height, ExportFormat::Png, 90)
            .unwrap()
            .bytes
    }

    fn engine() -> JsCropEngine {
        JsCropEngine::with_config(&png(600, 400), CropConfig::default()).unwrap()
    }

    #[test]
    fn test_engine_state() {
        let mut engine = engine();
        assert_eq!(engine.image_width(), 600);
        assert_eq!(engine.min_scale(), 0.75);
        assert_eq!(engine.scale(), 0.75);
        assert!(engine.covers_mask());

        assert_eq!(engine.set_scale(100.0), engine.max_scale());
        engine.pan(4.0, -2.0);
        assert_eq!((engine.offset_x(), engine.offset_y()), (4.0, -2.0));

        engine.reset();
        assert_eq!(engine.scale(), 0.75);
        assert_eq!(engine.offset_x(), 0.0);
    }

    #[test]
    fn test_render_preview_size() {
        let engine = engine();
        let rgba = engine.render_preview();
        assert_eq!(rgba.len(), 600 * 500 * 4);
    }

    #[test]
    fn test_export_sizes() {
        let engine = engine();
        let crop = engine.export(Some(40)).unwrap();
        assert_eq!(crop.mime_type(), "image/png");

        let default_size = engine.export(None).unwrap();
        assert!(default_size.byte_length() > crop.byte_length());
    }

    #[test]
    fn test_with_config_rejects_bad_input() {
        assert!(matches!(
            JsCropEngine::with_config(b"nope", CropConfig::default()),
            Err(SessionError::Load(_))
        ));

        let mut config = CropConfig::default();
        config.mask_size = 0;
        assert!(matches!(
            JsCropEngine::with_config(&png(10, 10), config),
            Err(SessionError::Config(_))
        ));
    }
}
