//! Source image decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{EncodedImage, LoadError, Orientation, SourceImage};

/// Decode an encoded image into a `SourceImage`, applying EXIF orientation.
///
/// The format is detected from the content, and the detected MIME type is kept
/// on the returned image so that the crop export can preserve it.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes (PNG, JPEG or WebP)
/// * `max_pixels` - Upper bound on `width * height` of the decoded raster
///
/// # Errors
///
/// Returns `LoadError::InvalidFormat` if the format is not recognized,
/// `LoadError::TooLarge` if the header announces more pixels than allowed, and
/// `LoadError::Corrupted` if decoding fails.
pub fn decode_source(bytes: &[u8], max_pixels: u64) -> Result<SourceImage, LoadError> {
    let format = image::guess_format(bytes).map_err(|_| LoadError::InvalidFormat)?;

    // Check the header before allocating the full raster
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| LoadError::Corrupted(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(LoadError::EmptyImage);
    }
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(LoadError::TooLarge {
            width,
            height,
            max_pixels,
        });
    }

    let orientation = extract_orientation(bytes);

    let img = ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|e| LoadError::Corrupted(e.to_string()))?;

    let oriented = apply_orientation(img, orientation);
    log::debug!(
        "decoded {} source {}x{} ({:?})",
        format.to_mime_type(),
        oriented.width(),
        oriented.height(),
        orientation
    );

    SourceImage::new(oriented.into_rgba8(), format.to_mime_type())
}

/// Decode an `EncodedImage`, e.g. a previous edit result fed back as input.
pub fn decode_encoded(image: &EncodedImage, max_pixels: u64) -> Result<SourceImage, LoadError> {
    decode_source(&image.bytes, max_pixels)
}

/// Extract EXIF orientation from encoded bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
