//! WASM bindings for the edit session.
//!
//! The edit service lives in JS and is asynchronous, so an edit is split in
//! two calls around the `await`:
//!
//! ```typescript
//! const ticket = session.begin_edit(undefined, references);
//! try {
//!   const result = await editService(prompt, ticket.base, references);
//!   session.complete_success(ticket, result);
//! } catch (err) {
//!   const message = session.complete_failure(ticket, err.kind, err.message);
//!   showError(message);
//! }
//! ```
//!
//! The session owns the crop engine for the loaded image. Pointer events go
//! through `pointer_*` with the canvas's `JsPointerController`, so a mode
//! switch drops the view along with the history.

use std::sync::Arc;

use reframe_core::decode::EncodedImage;
use reframe_core::pointer::PointerEvent;
use reframe_core::session::{
    EditCompletion, EditFailure, EditMode, EditSession, EditTicket, SavedImage, SessionError,
};
use reframe_core::transform::CropEngine;
use wasm_bindgen::prelude::*;

use crate::engine::parse_config;
use crate::pointer::{parse_touches, JsPointerController, JsPointerOutcome};
use crate::types::JsEncodedImage;

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Handle for one in-flight edit.
#[wasm_bindgen]
pub struct JsEditTicket {
    inner: EditTicket,
}

#[wasm_bindgen]
impl JsEditTicket {
    /// Base image to send to the edit service, if any.
    #[wasm_bindgen(getter)]
    pub fn base(&self) -> Option<JsEncodedImage> {
        self.inner.base().cloned().map(JsEncodedImage::from_shared)
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        self.inner.mode().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn reference_count(&self) -> usize {
        self.inner.references().len()
    }

    pub fn reference(&self, index: usize) -> Option<JsEncodedImage> {
        self.inner
            .references()
            .get(index)
            .cloned()
            .map(JsEncodedImage::from_shared)
    }
}

/// Editing state for the active mode.
#[wasm_bindgen]
pub struct JsEditSession {
    inner: EditSession,
}

#[wasm_bindgen]
impl JsEditSession {
    /// Create a session. `mode` defaults to `"renovation"`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, mode: Option<String>) -> Result<JsEditSession, JsValue> {
        let config = parse_config(config)?;
        let mode = match mode {
            Some(name) => name.parse::<EditMode>().map_err(to_js_error)?,
            None => EditMode::default(),
        };
        let inner = EditSession::with_mode(config, mode).map_err(to_js_error)?;
        Ok(JsEditSession { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        self.inner.mode().to_string()
    }

    /// Switch modes. Returns `false` if `mode` was already active.
    pub fn set_mode(&mut self, mode: &str) -> Result<bool, JsValue> {
        let mode = mode.parse::<EditMode>().map_err(to_js_error)?;
        Ok(self.inner.set_mode(mode))
    }

    /// Load an image into the session's crop engine.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner.load_image(bytes).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.inner.engine().is_some()
    }

    /// Set the zoom of the loaded image; returns the clamped scale.
    pub fn set_scale(&mut self, value: f64) -> Result<f64, JsValue> {
        Ok(self.engine_mut()?.set_scale(value))
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), JsValue> {
        self.engine_mut()?.pan(dx, dy);
        Ok(())
    }

    pub fn set_offset(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.engine_mut()?.set_offset(x, y);
        Ok(())
    }

    /// Back to the centered cover view.
    pub fn reset_view(&mut self) -> Result<(), JsValue> {
        self.engine_mut()?.reset();
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> Option<f64> {
        self.inner.engine().map(|engine| engine.view().scale)
    }

    #[wasm_bindgen(getter)]
    pub fn offset_x(&self) -> Option<f64> {
        self.inner.engine().map(|engine| engine.view().offset_x)
    }

    #[wasm_bindgen(getter)]
    pub fn offset_y(&self) -> Option<f64> {
        self.inner.engine().map(|engine| engine.view().offset_y)
    }

    #[wasm_bindgen(getter)]
    pub fn min_scale(&self) -> Option<f64> {
        self.inner.engine().map(CropEngine::min_scale)
    }

    #[wasm_bindgen(getter)]
    pub fn max_scale(&self) -> Option<f64> {
        self.inner.engine().map(CropEngine::max_scale)
    }

    /// Render the loaded image's preview as RGBA bytes.
    pub fn render_preview(&self) -> Result<Vec<u8>, JsValue> {
        let engine = self
            .inner
            .engine()
            .ok_or_else(|| to_js_error(SessionError::NoImage))?;
        Ok(engine.render_preview_image().into_raw())
    }

    pub fn pointer_down(
        &mut self,
        pointer: &mut JsPointerController,
        x: f64,
        y: f64,
    ) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::Down { x, y })
    }

    pub fn pointer_move(
        &mut self,
        pointer: &mut JsPointerController,
        x: f64,
        y: f64,
    ) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::Move { x, y })
    }

    pub fn pointer_up(&mut self, pointer: &mut JsPointerController) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::Up)
    }

    pub fn pointer_leave(&mut self, pointer: &mut JsPointerController) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::Leave)
    }

    pub fn touch_start(
        &mut self,
        pointer: &mut JsPointerController,
        touches: &[f64],
    ) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::TouchStart(parse_touches(touches)))
    }

    pub fn touch_move(
        &mut self,
        pointer: &mut JsPointerController,
        touches: &[f64],
    ) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::TouchMove(parse_touches(touches)))
    }

    pub fn touch_end(
        &mut self,
        pointer: &mut JsPointerController,
        touches: &[f64],
    ) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::TouchEnd(parse_touches(touches)))
    }

    pub fn touch_cancel(&mut self, pointer: &mut JsPointerController) -> JsPointerOutcome {
        self.drag(pointer, PointerEvent::TouchCancel)
    }

    /// Export the loaded image's crop and use it as the next base input.
    pub fn export_crop(&mut self) -> Result<JsEncodedImage, JsValue> {
        self.inner
            .export_crop()
            .map(JsEncodedImage::from_shared)
            .map_err(to_js_error)
    }

    /// Use `image` (an upload or a crop from a `JsCropEngine`) as the base input.
    pub fn set_base_input(&mut self, image: &JsEncodedImage) {
        self.inner.set_base_input(image.shared());
    }

    pub fn clear_base_input(&mut self) {
        self.inner.clear_base_input();
    }

    #[wasm_bindgen(getter)]
    pub fn base_input(&self) -> Option<JsEncodedImage> {
        self.inner.base_input().cloned().map(JsEncodedImage::from_shared)
    }

    /// Start an edit. Fails while another edit is in flight.
    pub fn begin_edit(
        &mut self,
        base: Option<JsEncodedImage>,
        references: Vec<JsEncodedImage>,
    ) -> Result<JsEditTicket, JsValue> {
        self.begin(base, references).map_err(to_js_error)
    }

    /// Record a successful edit. Returns `false` if the mode changed while
    /// the edit was in flight and the result was dropped.
    pub fn complete_success(&mut self, ticket: JsEditTicket, result: &JsEncodedImage) -> bool {
        let outcome = Ok(EncodedImage::clone(&result.shared()));
        matches!(
            self.inner.complete_edit(ticket.inner, outcome),
            Ok(EditCompletion::Applied { .. })
        )
    }

    /// Record a failed edit and return the message to show, or `None` if
    /// the edit was stale.
    ///
    /// `kind` is one of `safety`, `recitation`, `missing-credential`,
    /// `empty-response`; anything else is treated as a network error.
    pub fn complete_failure(
        &mut self,
        ticket: JsEditTicket,
        kind: &str,
        message: &str,
    ) -> Option<String> {
        let failure = EditFailure::from_kind(kind, message);
        self.inner
            .complete_edit(ticket.inner, Err(failure))
            .err()
            .map(|failure| failure.to_string())
    }

    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.inner.redo()
    }

    #[wasm_bindgen(getter)]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    #[wasm_bindgen(getter)]
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.inner.is_busy()
    }

    #[wasm_bindgen(getter)]
    pub fn history_length(&self) -> usize {
        self.inner.history().len()
    }

    /// History cursor, `-1` when no edit is active.
    #[wasm_bindgen(getter)]
    pub fn history_index(&self) -> i32 {
        i32::try_from(self.inner.history().position()).unwrap_or(i32::MAX)
    }

    #[wasm_bindgen(getter)]
    pub fn active_result(&self) -> Option<JsEncodedImage> {
        self.inner.active_result().cloned().map(JsEncodedImage::from_shared)
    }

    #[wasm_bindgen(getter)]
    pub fn active_input(&self) -> Option<JsEncodedImage> {
        self.inner.active_input().cloned().map(JsEncodedImage::from_shared)
    }

    #[wasm_bindgen(getter)]
    pub fn last_failure(&self) -> Option<String> {
        self.inner.last_failure().map(|failure| failure.to_string())
    }

    #[wasm_bindgen(getter)]
    pub fn last_failure_kind(&self) -> Option<String> {
        self.inner.last_failure().map(|failure| failure.kind().to_string())
    }

    pub fn clear_failure(&mut self) {
        self.inner.clear_failure();
    }

    /// Save the active result to the library. Returns the destination name.
    pub fn save_active(&mut self) -> Result<String, JsValue> {
        let saved = self.inner.save_active().map_err(to_js_error)?;
        Ok(saved.mode.destination().to_string())
    }

    /// Number of saved results for the current mode.
    #[wasm_bindgen(getter)]
    pub fn saved_count(&self) -> usize {
        self.inner.saved(self.inner.mode()).count()
    }

    /// Saved result `index` of the current mode, newest first.
    pub fn saved_result(&self, index: usize) -> Option<JsEncodedImage> {
        self.saved_at(index)
            .map(|saved| JsEncodedImage::from_shared(Arc::clone(&saved.result)))
    }

    /// Input of saved result `index`, if the edit had one.
    pub fn saved_original(&self, index: usize) -> Option<JsEncodedImage> {
        self.saved_at(index)
            .and_then(|saved| saved.original.clone())
            .map(JsEncodedImage::from_shared)
    }
}

impl JsEditSession {
    fn engine_mut(&mut self) -> Result<&mut CropEngine, JsValue> {
        self.inner
            .engine_mut()
            .ok_or_else(|| to_js_error(SessionError::NoImage))
    }

    fn drag(&mut self, pointer: &mut JsPointerController, event: PointerEvent) -> JsPointerOutcome {
        pointer.dispatch_to(self.inner.engine_mut(), event)
    }

    fn saved_at(&self, index: usize) -> Option<&SavedImage> {
        self.inner.saved(self.inner.mode()).nth(index)
    }

    fn begin(
        &mut self,
        base: Option<JsEncodedImage>,
        references: Vec<JsEncodedImage>,
    ) -> Result<JsEditTicket, SessionError> {
        let base: Option<Arc<EncodedImage>> = base.map(|image| image.shared());
        let references = references.iter().map(JsEncodedImage::shared).collect();
        let inner = self.inner.begin_edit(base, references)?;
        Ok(JsEditTicket { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_core::config::CropConfig;
    use reframe_core::encode::{encode_rgb, ExportFormat};

    fn session() -> JsEditSession {
        JsEditSession {
            inner: EditSession::new(CropConfig::default()).unwrap(),
        }
    }

    fn tagged(tag: u8) -> JsEncodedImage {
        JsEncodedImage::new(vec![tag], "image/png".to_string())
    }

    /// Left half red, right half blue.
    fn split_png() -> Vec<u8> {
        let (width, height) = (1200u32, 600u32);
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..height {
            for x in 0..width {
                let pixel = if x < width / 2 { [255, 0, 0] } else { [0, 0, 255] };
                pixels.extend_from_slice(&pixel);
            }
        }
        encode_rgb(&pixels, width, height, ExportFormat::Png, 90)
            .unwrap()
            .bytes
    }

    fn small_session() -> JsEditSession {
        let mut config = CropConfig::default();
        config.output_size = 48;
        JsEditSession {
            inner: EditSession::new(config).unwrap(),
        }
    }

    #[test]
    fn test_drag_moves_exported_crop() {
        let mut session = small_session();
        let mut pointer = JsPointerController::new(600.0, 500.0, 600.0, 500.0, 0.0, 0.0);
        assert!(!session.pointer_down(&mut pointer, 10.0, 10.0).moved());
        session.pointer_up(&mut pointer);

        session.load_image(&split_png()).unwrap();
        assert_eq!(session.scale(), Some(0.5));
        let centered = session.export_crop().unwrap().bytes();

        session.pointer_down(&mut pointer, 100.0, 100.0);
        let outcome = session.pointer_move(&mut pointer, 250.0, 100.0);
        assert!(outcome.moved());
        session.pointer_up(&mut pointer);
        assert_eq!(session.offset_x(), Some(150.0));

        let panned = session.export_crop().unwrap();
        assert_ne!(panned.bytes(), centered);
        assert_eq!(session.base_input().unwrap().bytes(), panned.bytes());

        // A mode switch drops the view with the history
        assert!(session.set_mode("marketplace").unwrap());
        assert!(!session.has_image());
        assert_eq!(session.offset_x(), None);
        session.pointer_down(&mut pointer, 0.0, 0.0);
        assert!(!session.pointer_move(&mut pointer, 50.0, 0.0).moved());
        session.pointer_up(&mut pointer);

        session.load_image(&split_png()).unwrap();
        assert_eq!(session.offset_x(), Some(0.0));
        assert_eq!(session.export_crop().unwrap().bytes(), centered);
    }

    #[test]
    fn test_view_controls() {
        let mut session = small_session();
        assert_eq!(session.scale(), None);

        session.load_image(&split_png()).unwrap();
        assert_eq!(session.min_scale(), Some(0.5));
        assert_eq!(session.set_scale(100.0).unwrap(), session.max_scale().unwrap());
        session.pan(3.0, 4.0).unwrap();
        session.set_offset(-7.0, 2.0).unwrap();
        assert_eq!((session.offset_x(), session.offset_y()), (Some(-7.0), Some(2.0)));

        session.reset_view().unwrap();
        assert_eq!(session.scale(), Some(0.5));
        assert_eq!(session.render_preview().unwrap().len(), 600 * 500 * 4);
    }

    #[test]
    fn test_saved_library() {
        let mut session = session();
        session.set_base_input(&tagged(1));
        let ticket = session.begin(None, vec![]).unwrap();
        assert!(session.complete_success(ticket, &tagged(2)));

        assert_eq!(session.save_active().unwrap(), "Renovision Pro");
        assert_eq!(session.saved_count(), 1);
        assert_eq!(session.saved_result(0).unwrap().bytes(), vec![2]);
        assert_eq!(session.saved_original(0).unwrap().bytes(), vec![1]);
        assert!(session.saved_result(1).is_none());

        assert!(session.set_mode("headshot").unwrap());
        assert_eq!(session.saved_count(), 0);
        assert!(session.set_mode("renovation").unwrap());
        assert_eq!(session.saved_count(), 1);
    }

    #[test]
    fn test_edit_round() {
        let mut session = session();
        session.set_base_input(&tagged(1));

        let ticket = session.begin(None, vec![tagged(7)]).unwrap();
        assert_eq!(ticket.base().unwrap().bytes(), vec![1]);
        assert_eq!(ticket.reference_count(), 1);
        assert_eq!(ticket.reference(0).unwrap().bytes(), vec![7]);
        assert!(ticket.reference(1).is_none());
        assert!(session.busy());

        assert!(session.complete_success(ticket, &tagged(2)));
        assert!(!session.busy());
        assert_eq!(session.history_length(), 1);
        assert_eq!(session.history_index(), 0);
        assert_eq!(session.base_input().unwrap().bytes(), vec![2]);
        assert_eq!(session.active_input().unwrap().bytes(), vec![1]);

        assert!(session.undo());
        assert_eq!(session.history_index(), -1);
        assert_eq!(session.base_input().unwrap().bytes(), vec![1]);
        assert!(session.can_redo());
    }

    #[test]
    fn test_busy() {
        let mut session = session();
        let _ticket = session.begin(None, vec![]).unwrap();
        assert!(matches!(session.begin(None, vec![]), Err(SessionError::Busy)));
    }

    #[test]
    fn test_failure_is_reported() {
        let mut session = session();
        let ticket = session.begin(Some(tagged(1)), vec![]).unwrap();

        let message = session.complete_failure(ticket, "safety", "ignored");
        assert_eq!(message.as_deref(), Some("Generation blocked by safety filters"));
        assert_eq!(session.last_failure_kind().as_deref(), Some("safety"));
        assert_eq!(session.history_length(), 0);

        session.clear_failure();
        assert!(session.last_failure().is_none());
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut session = session();
        let ticket = session.begin(Some(tagged(1)), vec![]).unwrap();
        assert_eq!(ticket.mode(), "renovation");

        assert!(session.inner.set_mode(EditMode::Marketplace));
        assert!(!session.complete_success(ticket, &tagged(2)));
        assert_eq!(session.history_length(), 0);
        assert_eq!(session.mode(), "marketplace");
    }
}
