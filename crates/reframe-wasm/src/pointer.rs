//! WASM bindings for pointer and touch dragging.
//!
//! JS forwards DOM events with client coordinates; the controller moves the
//! engine and reports whether a redraw or `preventDefault()` is needed.
//!
//! Touch lists are passed flat as `[id, x, y, id, x, y, ...]` taken from the
//! event's `changedTouches`.

use reframe_core::pointer::{
    PointerController, PointerEvent, PointerOutcome, SurfaceGeometry, TouchPoint,
};
use reframe_core::transform::CropEngine;
use wasm_bindgen::prelude::*;

use crate::engine::JsCropEngine;

/// What the host should do after an event.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsPointerOutcome {
    moved: bool,
    prevent_default: bool,
}

#[wasm_bindgen]
impl JsPointerOutcome {
    /// The view changed; redraw the preview.
    #[wasm_bindgen(getter)]
    pub fn moved(&self) -> bool {
        self.moved
    }

    /// Call `preventDefault()` on the event.
    #[wasm_bindgen(getter)]
    pub fn prevent_default(&self) -> bool {
        self.prevent_default
    }
}

/// Drag controller for one preview canvas.
#[wasm_bindgen]
pub struct JsPointerController {
    inner: PointerController,
}

#[wasm_bindgen]
impl JsPointerController {
    /// Create a controller for a canvas with the given backing size,
    /// displayed size and client origin (from `getBoundingClientRect()`).
    #[wasm_bindgen(constructor)]
    pub fn new(
        backing_width: f64,
        backing_height: f64,
        displayed_width: f64,
        displayed_height: f64,
        origin_x: f64,
        origin_y: f64,
    ) -> JsPointerController {
        JsPointerController {
            inner: PointerController::new(SurfaceGeometry {
                backing_width,
                backing_height,
                displayed_width,
                displayed_height,
                origin_x,
                origin_y,
            }),
        }
    }

    /// Update the displayed size and origin after layout changes.
    pub fn set_layout(
        &mut self,
        displayed_width: f64,
        displayed_height: f64,
        origin_x: f64,
        origin_y: f64,
    ) {
        let geometry = SurfaceGeometry {
            displayed_width,
            displayed_height,
            origin_x,
            origin_y,
            ..self.inner.geometry()
        };
        self.inner.set_geometry(geometry);
    }

    #[wasm_bindgen(getter)]
    pub fn dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    pub fn pointer_down(&mut self, engine: &mut JsCropEngine, x: f64, y: f64) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::Down { x, y })
    }

    pub fn pointer_move(&mut self, engine: &mut JsCropEngine, x: f64, y: f64) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::Move { x, y })
    }

    pub fn pointer_up(&mut self, engine: &mut JsCropEngine) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::Up)
    }

    pub fn pointer_leave(&mut self, engine: &mut JsCropEngine) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::Leave)
    }

    pub fn touch_start(&mut self, engine: &mut JsCropEngine, touches: &[f64]) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::TouchStart(parse_touches(touches)))
    }

    pub fn touch_move(&mut self, engine: &mut JsCropEngine, touches: &[f64]) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::TouchMove(parse_touches(touches)))
    }

    pub fn touch_end(&mut self, engine: &mut JsCropEngine, touches: &[f64]) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::TouchEnd(parse_touches(touches)))
    }

    pub fn touch_cancel(&mut self, engine: &mut JsCropEngine) -> JsPointerOutcome {
        self.dispatch(engine, PointerEvent::TouchCancel)
    }
}

impl JsPointerController {
    fn dispatch(&mut self, engine: &mut JsCropEngine, event: PointerEvent) -> JsPointerOutcome {
        self.dispatch_to(Some(engine.inner_mut()), event)
    }

    /// Drive `engine`, or only track the drag when no image is loaded.
    pub(crate) fn dispatch_to(
        &mut self,
        engine: Option<&mut CropEngine>,
        event: PointerEvent,
    ) -> JsPointerOutcome {
        let outcome = match engine {
            Some(engine) => self.inner.drive(&event, engine),
            None => {
                let outcome = self.inner.handle(&event, (0.0, 0.0));
                PointerOutcome {
                    offset: None,
                    ..outcome
                }
            }
        };
        JsPointerOutcome {
            moved: outcome.offset.is_some(),
            prevent_default: outcome.prevent_default,
        }
    }
}

/// Split a flat `[id, x, y, ...]` list. A trailing partial triple is ignored.
pub(crate) fn parse_touches(flat: &[f64]) -> Vec<TouchPoint> {
    flat.chunks_exact(3)
        .map(|chunk| TouchPoint {
            id: chunk[0] as i64,
            x: chunk[1],
            y: chunk[2],
        })
        .collect()
}
