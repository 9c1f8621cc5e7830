//! View transform: scale and offset of the image relative to the crop mask.
//!
//! A `ViewTransform` maps the image's center onto the mask's center, then
//! shifts it by `offset` and scales it by `scale`. It is a plain `Copy` value:
//! every operation returns a new transform instead of mutating in place.

use serde::{Deserialize, Serialize};

use crate::config::ZoomLimit;

/// Inclusive scale range `[min, max]` for one image and mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl ScaleBounds {
    /// Bounds for an image of `width x height` under a square mask.
    ///
    /// `min = max(mask/width, mask/height)` is the smallest scale at which the
    /// image still covers the whole mask.
    pub fn for_image(width: u32, height: u32, mask_size: u32, limit: ZoomLimit) -> Self {
        let min = cover_scale(width, height, mask_size);
        Self {
            min,
            max: limit.max_scale(min),
        }
    }

    /// Clamp a requested scale into the range. NaN clamps to `min`.
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

/// Smallest scale at which an image covers a square mask.
pub fn cover_scale(width: u32, height: u32, mask_size: u32) -> f64 {
    let mask = f64::from(mask_size);
    (mask / f64::from(width)).max(mask / f64::from(height))
}

/// Scale and offset of the image, in canvas (display) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ViewTransform {
    /// Centered transform at the given scale.
    pub fn centered(scale: f64) -> Self {
        Self {
            scale,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Same offset, scale clamped into `bounds`.
    #[must_use]
    pub fn with_scale(self, value: f64, bounds: ScaleBounds) -> Self {
        Self {
            scale: bounds.clamp(value),
            ..self
        }
    }

    /// Offset moved by `(dx, dy)`. Never clamped.
    #[must_use]
    pub fn panned(self, dx: f64, dy: f64) -> Self {
        Self {
            offset_x: self.offset_x + dx,
            offset_y: self.offset_y + dy,
            ..self
        }
    }

    /// Offset replaced by `(x, y)`.
    #[must_use]
    pub fn with_offset(self, x: f64, y: f64) -> Self {
        Self {
            offset_x: x,
            offset_y: y,
            ..self
        }
    }

    /// The transform in export space: scale and offset multiplied by `ratio`.
    #[must_use]
    pub fn scaled_by(self, ratio: f64) -> Self {
        Self {
            scale: self.scale * ratio,
            offset_x: self.offset_x * ratio,
            offset_y: self.offset_y * ratio,
        }
    }

    /// Rectangle `(left, top, right, bottom)` covered by a `width x height`
    /// image drawn around `center` with this transform.
    pub fn image_rect(self, width: u32, height: u32, center: (f64, f64)) -> (f64, f64, f64, f64) {
        let half_w = f64::from(width) * self.scale / 2.0;
        let half_h = f64::from(height) * self.scale / 2.0;
        let cx = center.0 + self.offset_x;
        let cy = center.1 + self.offset_y;
        (cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_scale_wide_image() {
        assert_eq!(cover_scale(2000, 1000, 500), 0.5);
    }

    #[test]
    fn test_cover_scale_tall_image() {
        assert_eq!(cover_scale(300, 1200, 600), 2.0);
    }

    #[test]
    fn test_bounds_relative() {
        let bounds = ScaleBounds::for_image(2000, 1000, 500, ZoomLimit::Relative(3.0));
        assert_eq!(bounds.min, 0.5);
        assert_eq!(bounds.max, 1.5);
    }

    #[test]
    fn test_clamp() {
        let bounds = ScaleBounds { min: 0.5, max: 2.0 };
        assert_eq!(bounds.clamp(0.1), 0.5);
        assert_eq!(bounds.clamp(1.2), 1.2);
        assert_eq!(bounds.clamp(9.0), 2.0);
        assert_eq!(bounds.clamp(f64::NAN), 0.5);
        assert_eq!(bounds.clamp(f64::INFINITY), 2.0);
        assert_eq!(bounds.clamp(f64::NEG_INFINITY), 0.5);
    }

    #[test]
    fn test_operations_return_new_values() {
        let bounds = ScaleBounds { min: 0.5, max: 2.0 };
        let start = ViewTransform::centered(0.5);

        let moved = start.panned(10.0, -4.0).panned(1.0, 1.0);
        assert_eq!(start, ViewTransform::centered(0.5));
        assert_eq!((moved.offset_x, moved.offset_y), (11.0, -3.0));

        let zoomed = moved.with_scale(1.5, bounds);
        assert_eq!(zoomed.scale, 1.5);
        assert_eq!((zoomed.offset_x, zoomed.offset_y), (11.0, -3.0));

        let placed = zoomed.with_offset(0.0, 2.0);
        assert_eq!((placed.offset_x, placed.offset_y), (0.0, 2.0));
    }

    #[test]
    fn test_scaled_by_ratio() {
        let view = ViewTransform {
            scale: 0.5,
            offset_x: 10.0,
            offset_y: -5.0,
        };
        let export = view.scaled_by(2.0);
        assert_eq!(export.scale, 1.0);
        assert_eq!((export.offset_x, export.offset_y), (20.0, -10.0));
    }

    #[test]
    fn test_image_rect() {
        let view = ViewTransform::centered(0.5);
        let rect = view.image_rect(2000, 1000, (300.0, 250.0));
        assert_eq!(rect, (-200.0, 0.0, 800.0, 500.0));
    }
}
