//! The canvas surface.
//!
//! A fixed-size RGBA buffer passed explicitly to the renderer (its only
//! writer) and the exporter (its reader).

use super::position::ImageDimensions;
use image::{Rgba, RgbaImage};

/// Default logical canvas width.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1000;
/// Default logical canvas height.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 650;

/// Fixed-resolution drawing surface.
#[derive(Clone)]
pub struct Surface {
    pixels: RgbaImage,
    frames: u64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("dimensions", &self.pixels.dimensions())
            .field("frames", &self.frames)
            .finish()
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl Surface {
    /// Create a blank, fully transparent surface. Zero dimensions are
    /// bumped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
            frames: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Current pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Number of completed frames drawn onto this surface.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    pub(crate) fn finish_frame(&mut self) {
        self.frames += 1;
    }
}
