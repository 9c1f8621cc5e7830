//! Raster drawing primitives for preview and export surfaces.
//!
//! # Algorithm
//!
//! The image is drawn by inverse mapping: for each destination pixel center
//! we compute where it lands in the source image and interpolate there.
//!
//! The forward transform is `dst = center + offset + scale * (src - size / 2)`,
//! so the inverse is:
//! ```text
//! src_x = (dst_x + 0.5 - center_x - offset_x) / scale + width / 2
//! src_y = (dst_y + 0.5 - center_y - offset_y) / scale + height / 2
//! ```
//!
//! Destination pixels whose inverse falls outside `[0, width) x [0, height)`
//! keep whatever the surface already holds (the background fill). The math
//! uses only `f64` arithmetic with no data-dependent ordering, so the same
//! inputs always produce the same pixels.

use image::{Rgba, RgbaImage};

use super::ViewTransform;
use crate::config::Color;

/// Fill the whole surface with `color`, replacing its content.
pub fn fill(surface: &mut RgbaImage, color: Color) {
    let px = color.to_rgba();
    for pixel in surface.pixels_mut() {
        *pixel = px;
    }
}

/// Draw `image` onto `surface` around `center` using `view`.
pub fn draw_image(
    surface: &mut RgbaImage,
    image: &RgbaImage,
    center: (f64, f64),
    view: ViewTransform,
) {
    if view.scale <= 0.0 || !view.scale.is_finite() {
        return;
    }

    let (src_w, src_h) = (f64::from(image.width()), f64::from(image.height()));
    let (left, top, right, bottom) = view.image_rect(image.width(), image.height(), center);

    // Only visit destination rows/columns the image can touch
    let Some((x_start, x_end)) = pixel_span(left, right, surface.width()) else {
        return;
    };
    let Some((y_start, y_end)) = pixel_span(top, bottom, surface.height()) else {
        return;
    };

    let origin_x = center.0 + view.offset_x;
    let origin_y = center.1 + view.offset_y;
    let inv_scale = 1.0 / view.scale;

    for dst_y in y_start..y_end {
        let src_y = (f64::from(dst_y) + 0.5 - origin_y) * inv_scale + src_h / 2.0;
        if src_y < 0.0 || src_y >= src_h {
            continue;
        }
        for dst_x in x_start..x_end {
            let src_x = (f64::from(dst_x) + 0.5 - origin_x) * inv_scale + src_w / 2.0;
            if src_x < 0.0 || src_x >= src_w {
                continue;
            }

            let sample = sample_bilinear(image, src_x - 0.5, src_y - 0.5);
            let dst = surface.get_pixel_mut(dst_x, dst_y);
            *dst = blend_over(sample, *dst);
        }
    }
}

/// Blend `color` over every pixel whose center lies in `[x0, x1) x [y0, y1)`.
pub fn fill_rect(surface: &mut RgbaImage, x0: f64, y0: f64, x1: f64, y1: f64, color: Color) {
    let Some((col_start, col_end)) = pixel_span(x0, x1, surface.width()) else {
        return;
    };
    let Some((row_start, row_end)) = pixel_span(y0, y1, surface.height()) else {
        return;
    };

    let src = color.to_rgba();
    for y in row_start..row_end {
        for x in col_start..col_end {
            let dst = surface.get_pixel_mut(x, y);
            *dst = blend_over(src, *dst);
        }
    }
}

/// Stroke the outline of a rectangle with a line of `width` pixels centered on
/// its edges, like a 2D canvas `strokeRect`.
pub fn stroke_rect(surface: &mut RgbaImage, x: f64, y: f64, size: f64, width: f64, color: Color) {
    if width <= 0.0 {
        return;
    }
    let half = width / 2.0;
    let (outer_x0, outer_y0) = (x - half, y - half);
    let (outer_x1, outer_y1) = (x + size + half, y + size + half);
    let (inner_x0, inner_y0) = (x + half, y + half);
    let (inner_x1, inner_y1) = (x + size - half, y + size - half);

    // Top and bottom bands span the full outer width; sides fill the gap
    fill_rect(surface, outer_x0, outer_y0, outer_x1, inner_y0, color);
    fill_rect(surface, outer_x0, inner_y1, outer_x1, outer_y1, color);
    fill_rect(surface, outer_x0, inner_y0, inner_x0, inner_y1, color);
    fill_rect(surface, inner_x1, inner_y0, outer_x1, inner_y1, color);
}

/// First and one-past-last pixel index whose center lies in `[start, end)`,
/// clipped to `[0, limit)`. `None` when the span is empty.
fn pixel_span(start: f64, end: f64, limit: u32) -> Option<(u32, u32)> {
    // Pixel i has center i + 0.5; it is inside when start <= i + 0.5 < end
    let first = (start - 0.5).ceil().max(0.0);
    let last = (end - 0.5).ceil().min(f64::from(limit));
    if first.is_nan() || last.is_nan() || first >= last {
        return None;
    }
    Some((first as u32, last as u32))
}

/// Sample a pixel using bilinear interpolation, clamping to the image edges.
///
/// Color channels are interpolated weighted by alpha so transparent pixels do
/// not bleed their (meaningless) color into opaque neighbours.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let max_x = f64::from(image.width() - 1);
    let max_y = f64::from(image.height() - 1);
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);

    // Fractional distances
    let fx = x - f64::from(x0);
    let fy = y - f64::from(y0);

    let taps = [
        (image.get_pixel(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (image.get_pixel(x1, y0), fx * (1.0 - fy)),
        (image.get_pixel(x0, y1), (1.0 - fx) * fy),
        (image.get_pixel(x1, y1), fx * fy),
    ];

    let mut color = [0.0f64; 3];
    let mut alpha = 0.0f64;
    for (pixel, weight) in taps {
        let a = f64::from(pixel[3]) * weight;
        for (channel, value) in color.iter_mut().zip(pixel.0) {
            *channel += f64::from(value) * a;
        }
        alpha += a;
    }

    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba([
        to_u8(color[0] / alpha),
        to_u8(color[1] / alpha),
        to_u8(color[2] / alpha),
        to_u8(alpha),
    ])
}

/// Source-over compositing with straight alpha.
fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let sa = f64::from(src[3]) / 255.0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (f64::from(src[i]) * sa + f64::from(dst[i]) * da * (1.0 - sa)) / out_a;
        out[i] = to_u8(c);
    }
    out[3] = to_u8(out_a * 255.0);
    Rgba(out)
}

#[inline]
fn to_u8(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Color = Color::rgb(0, 0, 0);

    fn solid(width: u32, height: u32, px: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, px)
    }

    #[test]
    fn test_pixel_span() {
        assert_eq!(pixel_span(0.0, 10.0, 100), Some((0, 10)));
        assert_eq!(pixel_span(-5.0, 3.0, 100), Some((0, 3)));
        assert_eq!(pixel_span(95.0, 120.0, 100), Some((95, 100)));
        // Pixel 2 has center 2.5, inside [2.4, 2.6)
        assert_eq!(pixel_span(2.4, 2.6, 100), Some((2, 3)));
        assert_eq!(pixel_span(2.6, 3.4, 100), None);
        assert_eq!(pixel_span(200.0, 300.0, 100), None);
    }

    #[test]
    fn test_draw_identity_copies_pixels() {
        let mut image = RgbaImage::new(4, 4);
        for (x, y, px) in image.enumerate_pixels_mut() {
            *px = Rgba([(x * 60) as u8, (y * 60) as u8, 7, 255]);
        }
        let mut surface = RgbaImage::new(4, 4);
        fill(&mut surface, BLACK);

        draw_image(&mut surface, &image, (2.0, 2.0), ViewTransform::centered(1.0));
        assert_eq!(surface, image);
    }

    #[test]
    fn test_draw_leaves_uncovered_pixels() {
        let image = solid(2, 2, RED);
        let mut surface = RgbaImage::new(6, 6);
        fill(&mut surface, BLACK);

        draw_image(&mut surface, &image, (3.0, 3.0), ViewTransform::centered(1.0));
        assert_eq!(*surface.get_pixel(2, 2), RED);
        assert_eq!(*surface.get_pixel(3, 3), RED);
        assert_eq!(*surface.get_pixel(0, 0), BLACK.to_rgba());
        assert_eq!(*surface.get_pixel(4, 3), BLACK.to_rgba());
    }

    #[test]
    fn test_draw_upscale_fills_target() {
        let image = solid(2, 2, RED);
        let mut surface = RgbaImage::new(8, 8);
        fill(&mut surface, BLACK);

        draw_image(&mut surface, &image, (4.0, 4.0), ViewTransform::centered(4.0));
        assert!(surface.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_draw_offset_moves_image() {
        let image = solid(2, 2, RED);
        let mut surface = RgbaImage::new(8, 8);
        fill(&mut surface, BLACK);

        let view = ViewTransform::centered(1.0).panned(3.0, -3.0);
        draw_image(&mut surface, &image, (4.0, 4.0), view);
        assert_eq!(*surface.get_pixel(6, 0), RED);
        assert_eq!(*surface.get_pixel(7, 1), RED);
        assert_eq!(*surface.get_pixel(3, 3), BLACK.to_rgba());
    }

    #[test]
    fn test_draw_fully_outside_is_noop() {
        let image = solid(2, 2, RED);
        let mut surface = RgbaImage::new(4, 4);
        fill(&mut surface, BLACK);
        let before = surface.clone();

        let view = ViewTransform::centered(1.0).panned(100.0, 0.0);
        draw_image(&mut surface, &image, (2.0, 2.0), view);
        assert_eq!(surface, before);
    }

    #[test]
    fn test_transparent_source_shows_background() {
        let image = solid(2, 2, Rgba([255, 0, 0, 0]));
        let mut surface = RgbaImage::new(2, 2);
        fill(&mut surface, Color::WHITE);

        draw_image(&mut surface, &image, (1.0, 1.0), ViewTransform::centered(1.0));
        assert!(surface.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_blend_over_half_alpha() {
        let out = blend_over(Rgba([255, 0, 0, 128]), Rgba([0, 0, 255, 255]));
        assert_eq!(out[3], 255);
        assert_eq!(out[0], 128);
        assert_eq!(out[2], 127);
    }

    #[test]
    fn test_fill_rect_blends() {
        let mut surface = RgbaImage::new(4, 4);
        fill(&mut surface, Color::WHITE);

        fill_rect(&mut surface, 0.0, 0.0, 2.0, 4.0, Color::rgba(0, 0, 0, 179));
        let dimmed = surface.get_pixel(0, 0);
        assert!(dimmed[0] < 100);
        assert_eq!(*surface.get_pixel(3, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_stroke_rect_outline_only() {
        let mut surface = RgbaImage::new(10, 10);
        fill(&mut surface, BLACK);

        stroke_rect(&mut surface, 2.0, 2.0, 6.0, 2.0, Color::WHITE);
        let white = Color::WHITE.to_rgba();
        // Line straddles the edge at x = 2: pixels 1 and 2
        assert_eq!(*surface.get_pixel(1, 5), white);
        assert_eq!(*surface.get_pixel(2, 5), white);
        assert_eq!(*surface.get_pixel(5, 5), BLACK.to_rgba());
        assert_eq!(*surface.get_pixel(5, 1), white);
        assert_eq!(*surface.get_pixel(8, 8), white);
        assert_eq!(*surface.get_pixel(0, 0), BLACK.to_rgba());
    }
}
