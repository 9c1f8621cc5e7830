//! Pointer and touch input for dragging the crop view.
//!
//! Mouse and touch events are folded into a single drag session before they
//! reach the engine. Client coordinates are remapped into canvas backing
//! pixels, so a canvas scaled down by CSS still drags at the right speed.
//!
//! A drag stores the anchor `canvas - offset` when it starts; every move then
//! sets `offset = canvas - anchor`, which keeps the grabbed image point under
//! the pointer.

use serde::{Deserialize, Serialize};

use crate::transform::CropEngine;

/// On-screen placement of the preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceGeometry {
    /// Intrinsic (backing) width of the surface.
    pub backing_width: f64,
    /// Intrinsic (backing) height of the surface.
    pub backing_height: f64,
    /// Width the surface is displayed at, in client pixels.
    pub displayed_width: f64,
    /// Height the surface is displayed at, in client pixels.
    pub displayed_height: f64,
    /// Client x of the surface's top-left corner.
    pub origin_x: f64,
    /// Client y of the surface's top-left corner.
    pub origin_y: f64,
}

impl SurfaceGeometry {
    /// A surface displayed at its backing size with its origin at `(0, 0)`.
    pub fn unscaled(width: f64, height: f64) -> Self {
        Self {
            backing_width: width,
            backing_height: height,
            displayed_width: width,
            displayed_height: height,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }

    /// Map a client coordinate into canvas backing pixels.
    pub fn remap(&self, client_x: f64, client_y: f64) -> (f64, f64) {
        let scale_x = axis_ratio(self.backing_width, self.displayed_width);
        let scale_y = axis_ratio(self.backing_height, self.displayed_height);
        (
            (client_x - self.origin_x) * scale_x,
            (client_y - self.origin_y) * scale_y,
        )
    }
}

/// `backing / displayed`, or 1 when the display size is degenerate.
fn axis_ratio(backing: f64, displayed: f64) -> f64 {
    let ratio = backing / displayed;
    if displayed > 0.0 && ratio.is_finite() {
        ratio
    } else {
        1.0
    }
}

/// One touch point in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i64,
    pub x: f64,
    pub y: f64,
}

/// Input events understood by the controller, in client coordinates.
///
/// Touch variants carry the event's changed touches.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    Leave,
    TouchStart(Vec<TouchPoint>),
    TouchMove(Vec<TouchPoint>),
    TouchEnd(Vec<TouchPoint>),
    TouchCancel,
}

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerOutcome {
    /// New image offset, when the event moved the drag.
    pub offset: Option<(f64, f64)>,
    /// The host should suppress the event's default action (page scrolling).
    pub prevent_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragSource {
    Mouse,
    Touch(i64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    source: DragSource,
    anchor: (f64, f64),
}

/// Turns raw input into drag offsets.
#[derive(Debug, Clone)]
pub struct PointerController {
    geometry: SurfaceGeometry,
    drag: Option<DragSession>,
}

impl PointerController {
    pub fn new(geometry: SurfaceGeometry) -> Self {
        Self {
            geometry,
            drag: None,
        }
    }

    /// Update the surface placement, e.g. after a layout change.
    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// End any active drag without emitting an offset.
    pub fn cancel(&mut self) {
        self.drag = None;
    }

    /// Handle one event given the engine's current offset.
    pub fn handle(&mut self, event: &PointerEvent, current_offset: (f64, f64)) -> PointerOutcome {
        match event {
            PointerEvent::Down { x, y } => {
                self.begin(DragSource::Mouse, *x, *y, current_offset);
                PointerOutcome::default()
            }
            PointerEvent::Move { x, y } => PointerOutcome {
                offset: self.drag_to(DragSource::Mouse, *x, *y),
                prevent_default: false,
            },
            PointerEvent::Up | PointerEvent::Leave => {
                self.end(|source| source == DragSource::Mouse);
                PointerOutcome::default()
            }
            PointerEvent::TouchStart(touches) => {
                // Only the first touch drives the drag
                if let Some(touch) = touches.first() {
                    self.begin(DragSource::Touch(touch.id), touch.x, touch.y, current_offset);
                }
                PointerOutcome::default()
            }
            PointerEvent::TouchMove(touches) => {
                let Some(DragSession {
                    source: DragSource::Touch(id),
                    ..
                }) = self.drag
                else {
                    // A mouse drag still owns the surface; keep the page from scrolling
                    return PointerOutcome {
                        offset: None,
                        prevent_default: self.drag.is_some(),
                    };
                };
                let offset = touches
                    .iter()
                    .find(|touch| touch.id == id)
                    .and_then(|touch| self.drag_to(DragSource::Touch(id), touch.x, touch.y));
                PointerOutcome {
                    offset,
                    prevent_default: true,
                }
            }
            PointerEvent::TouchEnd(touches) => {
                self.end(|source| match source {
                    DragSource::Touch(id) => touches.iter().any(|touch| touch.id == id),
                    DragSource::Mouse => false,
                });
                PointerOutcome::default()
            }
            PointerEvent::TouchCancel => {
                self.end(|source| matches!(source, DragSource::Touch(_)));
                PointerOutcome::default()
            }
        }
    }

    /// Handle one event and apply any resulting offset to `engine`.
    pub fn drive(&mut self, event: &PointerEvent, engine: &mut CropEngine) -> PointerOutcome {
        let view = engine.view();
        let outcome = self.handle(event, (view.offset_x, view.offset_y));
        if let Some((x, y)) = outcome.offset {
            engine.set_offset(x, y);
        }
        outcome
    }

    fn begin(&mut self, source: DragSource, client_x: f64, client_y: f64, offset: (f64, f64)) {
        if self.drag.is_some() {
            return;
        }
        let (x, y) = self.geometry.remap(client_x, client_y);
        let anchor = (x - offset.0, y - offset.1);
        if anchor.0.is_finite() && anchor.1.is_finite() {
            self.drag = Some(DragSession { source, anchor });
        }
    }

    fn drag_to(&self, source: DragSource, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
        let session = self.drag.filter(|session| session.source == source)?;
        let (x, y) = self.geometry.remap(client_x, client_y);
        let offset = (x - session.anchor.0, y - session.anchor.1);
        (offset.0.is_finite() && offset.1.is_finite()).then_some(offset)
    }

    fn end(&mut self, ends: impl Fn(DragSource) -> bool) {
        if self.drag.is_some_and(|session| ends(session.source)) {
            self.drag = None;
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
