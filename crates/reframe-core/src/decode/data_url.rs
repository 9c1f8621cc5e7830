//! `data:` URL conversion for encoded images.
//!
//! Browser uploads and canvas exports travel as `data:<mime>;base64,<payload>`
//! strings. Bare base64 without the header is accepted too, in which case the
//! MIME type is sniffed from the decoded bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::{EncodedImage, LoadError};

const BASE64_MARKER: &str = ";base64,";

impl EncodedImage {
    /// Parse a `data:` URL (or a bare base64 payload) into an encoded image.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidDataUrl` if the header is malformed or the
    /// payload is not valid base64, and `LoadError::InvalidFormat` if a bare
    /// payload is not a recognizable image.
    pub fn from_data_url(url: &str) -> Result<Self, LoadError> {
        let url = url.trim();

        let Some(rest) = url.strip_prefix("data:") else {
            let bytes = decode_payload(url)?;
            return Self::sniff(bytes);
        };

        let (mime_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| LoadError::InvalidDataUrl("missing ;base64, marker".to_string()))?;
        if mime_type.is_empty() {
            return Err(LoadError::InvalidDataUrl("missing MIME type".to_string()));
        }

        Ok(Self::new(decode_payload(payload)?, mime_type))
    }

    /// Render this image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{}{}{}",
            self.mime_type,
            BASE64_MARKER,
            STANDARD.encode(&self.bytes)
        )
    }
}

fn decode_payload(payload: &str) -> Result<Vec<u8>, LoadError> {
    STANDARD
        .decode(payload)
        .map_err(|e| LoadError::InvalidDataUrl(e.to_string()))
}
