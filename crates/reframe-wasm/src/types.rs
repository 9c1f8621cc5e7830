//! WASM-compatible wrapper types for encoded images.
//!
//! Encoded images move between the crop engine, the edit session and the
//! JS edit service. The wrapper shares the underlying bytes, so passing one
//! from an export into a session does not copy the image.

use std::sync::Arc;

use reframe_core::decode::EncodedImage;
use wasm_bindgen::prelude::*;

/// An encoded image (PNG, JPEG or WebP bytes plus mime type).
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsEncodedImage {
    inner: Arc<EncodedImage>,
}

#[wasm_bindgen]
impl JsEncodedImage {
    /// Wrap encoded bytes. The mime type is taken as given.
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: Vec<u8>, mime_type: String) -> JsEncodedImage {
        Self::from_encoded(EncodedImage::new(bytes, mime_type))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL or a bare base64 payload.
    pub fn from_data_url(url: &str) -> Result<JsEncodedImage, JsValue> {
        EncodedImage::from_data_url(url)
            .map(Self::from_encoded)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.len()
    }

    /// Returns the encoded bytes as a Uint8Array (copied into JS memory).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    /// Format as a data URL, e.g. for an `<img>` source.
    pub fn to_data_url(&self) -> String {
        self.inner.to_data_url()
    }
}

impl JsEncodedImage {
    pub(crate) fn from_encoded(image: EncodedImage) -> Self {
        Self::from_shared(Arc::new(image))
    }

    pub(crate) fn from_shared(inner: Arc<EncodedImage>) -> Self {
        Self { inner }
    }

    pub(crate) fn shared(&self) -> Arc<EncodedImage> {
        Arc::clone(&self.inner)
    }
}
