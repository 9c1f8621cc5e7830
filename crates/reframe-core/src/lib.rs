//! Reframe Core - crop engine and edit history
//!
//! This crate provides the core functionality for Reframe: positioning and
//! zooming an image under a square crop mask, exporting the masked region at
//! a higher resolution, and stacking successive AI edits with undo/redo.
//!
//! # Module Structure
//!
//! - `config` - Crop engine configuration and validation
//! - `decode` - Source decoding (PNG, JPEG, WebP, data URLs)
//! - `transform` - View transform, preview rendering and export
//! - `pointer` - Mouse and touch drag handling
//! - `encode` - PNG/JPEG encoding of exported crops
//! - `history` - Branch-truncating undo/redo history
//! - `session` - Cumulative input feed and mode handling
//!
//! Nothing here installs a logger; records go through the `log` facade.

pub mod config;
pub mod decode;
pub mod encode;
pub mod history;
pub mod pointer;
pub mod session;
pub mod transform;

pub use config::{Color, ConfigError, CropConfig, ZoomLimit};
pub use decode::{EncodedImage, LoadError, SourceImage};
pub use encode::{EncodeError, ExportFormat};
pub use history::{EditHistory, HistoryEntry};
pub use pointer::{PointerController, PointerEvent, PointerOutcome, SurfaceGeometry, TouchPoint};
pub use session::{
    EditCollaborator, EditCompletion, EditFailure, EditMode, EditRequest, EditSession, EditTicket,
    SavedImage, SessionError,
};
pub use transform::{CropEngine, RenderError, ScaleBounds, ViewTransform};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// Load, pan, export, edit, undo: the whole flow through the public API.
    #[test]
    fn test_crop_and_edit_flow() {
        let mut config = CropConfig::default();
        config.output_size = 64;
        let mut session = EditSession::new(config).unwrap();

        let source = RgbaImage::from_pixel(900, 600, Rgba([30, 60, 90, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(source)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        session.load_image(&bytes).unwrap();

        let mut pointer = PointerController::new(SurfaceGeometry::unscaled(600.0, 500.0));
        let engine = session.engine_mut().unwrap();
        pointer.drive(&PointerEvent::Down { x: 300.0, y: 250.0 }, engine);
        pointer.drive(&PointerEvent::Move { x: 310.0, y: 250.0 }, engine);
        pointer.drive(&PointerEvent::Up, engine);
        assert!(engine.covers_mask());

        let crop = session.export_crop().unwrap();
        let edited = session
            .run_edit(
                &|request: &EditRequest| -> Result<EncodedImage, EditFailure> {
                    assert!(request.base_image.is_some());
                    Ok(EncodedImage::new(vec![1, 2, 3], "image/png"))
                },
                "make it brighter",
                "test-model",
                None,
                Vec::new(),
            )
            .unwrap();
        assert_eq!(edited.bytes, [1, 2, 3]);
        assert_eq!(session.active_input(), Some(&crop));

        assert!(session.undo());
        assert_eq!(session.base_input(), Some(&crop));

        assert!(session.redo());
        let saved = session.save_active().unwrap();
        assert_eq!(saved.result, edited);
        assert_eq!(saved.original.as_ref(), Some(&crop));
    }
}
