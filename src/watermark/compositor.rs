//! Compositor for blending layers onto the canvas surface.
//!
//! # Features
//!
//! - Porter-Duff "over" blending with an extra global opacity
//! - Position-aware compositing with clipping at the canvas edges
//! - Scaled drawing that only samples the part of the overlay that lands on
//!   the canvas, so overlay size never drives memory use
//! - Stretch-to-fill drawing for the product mockup
//!
//! # Example
//!
//! ```ignore
//! use brandmark::watermark::compositor::{blend_layer, draw_scaled, WatermarkLayer};
//!
//! blend_layer(&mut target_image, &WatermarkLayer {
//!     image: watermark_image,
//!     position: PlacementPosition { x: 10, y: 10 },
//!     opacity: 0.5,
//! });
//!
//! draw_scaled(&mut target_image, &logo, PlacementPosition::new(-40, 20), &size, 0.8);
//! ```

use super::position::{visible_region, ImageDimensions, PlacementPosition, WatermarkDimensions};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

/// An image layer to be composited onto the canvas.
#[derive(Clone)]
pub struct WatermarkLayer {
    /// The layer image (RGBA).
    pub image: RgbaImage,
    /// Top-left corner of the layer on the canvas.
    pub position: PlacementPosition,
    /// Opacity to apply (0.0 to 1.0). Applied on top of the image's alpha channel.
    pub opacity: f32,
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .field("opacity", &self.opacity)
            .finish()
    }
}

/// Resize `source` to exactly fill the target and draw it over the target.
///
/// The source aspect ratio is not preserved.
pub fn draw_stretched(target: &mut RgbaImage, source: &RgbaImage) {
    let (width, height) = target.dimensions();
    let layer = WatermarkLayer {
        image: resize_exact(source, width, height),
        position: PlacementPosition::new(0, 0),
        opacity: 1.0,
    };
    blend_layer(target, &layer);
}

/// Resize an image to the given dimensions.
pub fn resize_exact(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if source.dimensions() == (width, height) {
        return source.clone();
    }
    image::imageops::resize(source, width.max(1), height.max(1), FilterType::Triangle)
}

/// Draw `source` scaled to `size` with its top-left corner at `position`.
///
/// Only destination pixels inside the canvas are visited. Each one samples
/// the source bilinearly, so a 900 x 4,500,000 overlay costs no more than
/// the canvas it is clipped to.
pub fn draw_scaled(
    target: &mut RgbaImage,
    source: &RgbaImage,
    position: PlacementPosition,
    size: &WatermarkDimensions,
    opacity: f32,
) {
    if opacity <= 0.0 || source.width() == 0 || source.height() == 0 {
        return;
    }

    let clip = match visible_region(&position, &dimensions_of(target), size) {
        Some(clip) => clip,
        None => return,
    };

    let step_x = source.width() as f64 / size.width.max(1) as f64;
    let step_y = source.height() as f64 / size.height.max(1) as f64;

    for ty in clip.y0..clip.y1 {
        let v = ((ty as i64 - position.y as i64) as f64 + 0.5) * step_y - 0.5;
        for tx in clip.x0..clip.x1 {
            let u = ((tx as i64 - position.x as i64) as f64 + 0.5) * step_x - 0.5;
            let sample = sample_bilinear(source, u, v);
            let background = *target.get_pixel(tx, ty);
            target.put_pixel(tx, ty, blend_pixels(background, sample, opacity));
        }
    }
}

/// Bilinear sample at source coordinates `(u, v)`, clamped to the edges.
///
/// Interpolates premultiplied colors so transparent texels do not bleed
/// their color into visible ones.
fn sample_bilinear(source: &RgbaImage, u: f64, v: f64) -> Rgba<u8> {
    let max_x = (source.width() - 1) as f64;
    let max_y = (source.height() - 1) as f64;
    let u = u.clamp(0.0, max_x);
    let v = v.clamp(0.0, max_y);

    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(source.width() - 1);
    let y1 = (y0 + 1).min(source.height() - 1);
    let fx = u - x0 as f64;
    let fy = v - y0 as f64;

    let mut acc = [0.0f64; 4];
    for (x, y, weight) in [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ] {
        if weight == 0.0 {
            continue;
        }
        let px = source.get_pixel(x, y);
        let alpha = px[3] as f64 * weight;
        acc[0] += px[0] as f64 * alpha;
        acc[1] += px[1] as f64 * alpha;
        acc[2] += px[2] as f64 * alpha;
        acc[3] += alpha;
    }

    if acc[3] <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |c: f64| (c / acc[3]).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(acc[0]),
        channel(acc[1]),
        channel(acc[2]),
        acc[3].round().clamp(0.0, 255.0) as u8,
    ])
}

/// Dimensions of an image as an `ImageDimensions`.
pub fn dimensions_of(image: &RgbaImage) -> ImageDimensions {
    ImageDimensions {
        width: image.width(),
        height: image.height(),
    }
}

/// Blend a single layer onto the target image.
pub fn blend_layer(target: &mut RgbaImage, layer: &WatermarkLayer) {
    if layer.opacity <= 0.0 {
        return;
    }

    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let wm_width = layer.image.width() as i32;
    let wm_height = layer.image.height() as i32;

    // Visible region, clamped to target bounds
    let x_start = layer.position.x.max(0);
    let y_start = layer.position.y.max(0);
    let x_end = (layer.position.x + wm_width).min(target_width);
    let y_end = (layer.position.y + wm_height).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wx = (tx - layer.position.x) as u32;
            let wy = (ty - layer.position.y) as u32;

            let wm_pixel = layer.image.get_pixel(wx, wy);
            let target_pixel = target.get_pixel(tx as u32, ty as u32);

            let blended = blend_pixels(*target_pixel, *wm_pixel, layer.opacity);
            target.put_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if fg_alpha <= 0.0 {
        return background;
    }
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
