//! Placement geometry for the watermark overlay.
//!
//! The overlay is sized relative to the canvas width and centered on a
//! normalized anchor. All functions here are pure so the renderer can stay
//! a straight recomputation from state.
//!
//! # Example
//!
//! ```ignore
//! use brandmark::watermark::position::{centered_at, target_size, ImageDimensions};
//!
//! let canvas = ImageDimensions { width: 1000, height: 650 };
//! let natural = ImageDimensions { width: 200, height: 100 };
//!
//! let size = target_size(0.3, &canvas, &natural).unwrap();
//! assert_eq!((size.width, size.height), (300, 150));
//! ```

use super::state::Anchor;

/// Smallest overlay width in pixels, regardless of scale.
pub const MIN_TARGET_WIDTH: f32 = 16.0;

/// Dimensions of the canvas or of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the watermark to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner where a watermark should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Unrounded overlay width for a given scale and canvas width.
///
/// `max(16, min(W, scale * W))`. The lower bound wins for canvases narrower
/// than 16 pixels.
pub fn target_width(scale: f32, canvas_width: u32) -> f32 {
    let w = canvas_width as f32;
    (scale * w).min(w).max(MIN_TARGET_WIDTH)
}

/// Compute the overlay size for an image watermark.
///
/// Width follows [`target_width`]; height preserves the watermark's own
/// intrinsic aspect ratio, independent of the canvas aspect.
///
/// Returns `None` for a watermark with a zero dimension, which has no
/// drawable area.
pub fn target_size(
    scale: f32,
    canvas: &ImageDimensions,
    natural: &ImageDimensions,
) -> Option<WatermarkDimensions> {
    if natural.width == 0 || natural.height == 0 {
        return None;
    }

    let width = target_width(scale, canvas.width);
    let height = width * (natural.height as f32 / natural.width as f32);

    Some(WatermarkDimensions {
        width: (width.round() as u32).max(1),
        height: (height.round() as u32).max(1),
    })
}

/// Map a normalized anchor to canvas pixel coordinates.
pub fn anchor_point(anchor: Anchor, canvas: &ImageDimensions) -> (f32, f32) {
    (
        anchor.x * canvas.width as f32,
        anchor.y * canvas.height as f32,
    )
}

/// Top-left corner that centers a watermark of the given size on the anchor.
///
/// Coordinates may be negative when the anchor sits near an edge; the
/// compositor clips whatever falls outside the canvas.
pub fn centered_at(
    anchor: Anchor,
    canvas: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let (cx, cy) = anchor_point(anchor, canvas);
    let x = cx - watermark.width as f32 / 2.0;
    let y = cy - watermark.height as f32 / 2.0;
    PlacementPosition::new(x.round() as i32, y.round() as i32)
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl ClipRect {
    /// Rectangle covering a whole `width x height` area.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// The same rectangle relative to `origin`.
    ///
    /// `origin` must not lie right of or below the rectangle's top-left
    /// corner; [`visible_region`] guarantees this for its result.
    pub fn relative_to(&self, origin: PlacementPosition) -> Self {
        let dx = self.x0 as i64 - origin.x as i64;
        let dy = self.y0 as i64 - origin.y as i64;
        let x0 = dx.max(0) as u32;
        let y0 = dy.max(0) as u32;
        Self {
            x0,
            y0,
            x1: x0 + self.width(),
            y1: y0 + self.height(),
        }
    }
}

/// Part of a placed watermark that falls on the canvas, in canvas
/// coordinates.
///
/// Returns `None` when the placement is entirely off-canvas. Works in 64-bit
/// so oversized overlays cannot wrap around.
pub fn visible_region(
    pos: &PlacementPosition,
    canvas: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> Option<ClipRect> {
    let left = pos.x as i64;
    let top = pos.y as i64;
    let right = left + watermark.width as i64;
    let bottom = top + watermark.height as i64;

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = right.min(canvas.width as i64);
    let y1 = bottom.min(canvas.height as i64);

    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(ClipRect {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}
