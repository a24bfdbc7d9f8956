//! Full-frame renderer for a [`CompositionState`].
//!
//! Every call clears the surface and recomputes the frame from state. Nothing
//! is cached between frames, so calling it twice on the same state produces
//! the same pixels.
//!
//! # Example
//!
//! ```ignore
//! use brandmark::watermark::{CompositionState, Renderer, Surface, TextStyle};
//!
//! let renderer = Renderer::new(TextStyle::default_font()?);
//! let mut surface = Surface::new(1000, 650);
//! renderer.render(&state, &mut surface);
//! ```

use super::compositor::{blend_layer, dimensions_of, draw_scaled, draw_stretched, WatermarkLayer};
use super::position::{centered_at, target_size, visible_region, PlacementPosition, WatermarkDimensions};
use super::state::{CompositionState, Transform, WatermarkDescriptor};
use super::surface::Surface;
use super::text_renderer::{
    default_font, render_text_region, text_layer_size, Color, TextRenderOptions,
};
use super::WatermarkError;
use ab_glyph::FontArc;
use image::RgbaImage;

/// Smallest font size used for text watermarks.
pub const MIN_FONT_SIZE: f32 = 12.0;

/// Font size as a fraction of the target width (`scale * W`).
pub const FONT_SIZE_RATIO: f32 = 0.05;

/// How text watermarks are drawn.
#[derive(Clone)]
pub struct TextStyle {
    pub font: FontArc,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f32,
}

impl std::fmt::Debug for TextStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextStyle")
            .field("fill", &self.fill)
            .field("stroke", &self.stroke)
            .field("stroke_width", &self.stroke_width)
            .finish()
    }
}

impl TextStyle {
    /// White fill with a 2px black outline in the embedded font.
    pub fn default_font() -> Result<Self, WatermarkError> {
        Ok(Self {
            font: default_font()?,
            fill: Color::white(),
            stroke: Color::black(),
            stroke_width: 2.0,
        })
    }
}

/// What a render call drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Product not ready; the surface was left untouched.
    Skipped,
    /// Product drawn with no overlay.
    ProductOnly,
    /// Product drawn with the watermark on top.
    Composited,
}

/// Font size for a text watermark: `max(12, W * scale * 0.05)`.
pub fn text_font_size(scale: f32, canvas_width: u32) -> f32 {
    (canvas_width as f32 * scale * FONT_SIZE_RATIO).max(MIN_FONT_SIZE)
}

/// Draws composition state onto a surface.
#[derive(Debug, Clone)]
pub struct Renderer {
    text_style: TextStyle,
}

impl Renderer {
    pub fn new(text_style: TextStyle) -> Self {
        Self { text_style }
    }

    pub fn text_style(&self) -> &TextStyle {
        &self.text_style
    }

    /// Render one frame.
    ///
    /// A product that is missing or not ready makes this a no-op, so the
    /// previous frame (or a blank surface) stays in place.
    pub fn render(&self, state: &CompositionState, surface: &mut Surface) -> RenderOutcome {
        let product = match state.product().and_then(|p| p.image()) {
            Some(image) => image,
            None => {
                tracing::trace!("Product not ready, skipping render");
                return RenderOutcome::Skipped;
            }
        };

        surface.clear();
        draw_stretched(surface.image_mut(), product);

        let transform = state.transform();
        let outcome = match state.watermark() {
            WatermarkDescriptor::Image { resource } => match resource.image() {
                Some(watermark) => self.draw_image(surface, watermark, transform),
                None => RenderOutcome::ProductOnly,
            },
            WatermarkDescriptor::Text { content } if !content.is_empty() => {
                self.draw_text(surface, content, transform)
            }
            WatermarkDescriptor::Text { .. }
            | WatermarkDescriptor::Passthrough { .. }
            | WatermarkDescriptor::None => RenderOutcome::ProductOnly,
        };

        surface.finish_frame();
        outcome
    }

    fn draw_image(
        &self,
        surface: &mut Surface,
        watermark: &RgbaImage,
        transform: &Transform,
    ) -> RenderOutcome {
        let canvas = surface.dimensions();
        let size = match target_size(transform.scale(), &canvas, &dimensions_of(watermark)) {
            Some(size) => size,
            None => return RenderOutcome::ProductOnly,
        };

        let position = centered_at(transform.anchor(), &canvas, &size);
        draw_scaled(surface.image_mut(), watermark, position, &size, transform.opacity());
        RenderOutcome::Composited
    }

    fn draw_text(&self, surface: &mut Surface, content: &str, transform: &Transform) -> RenderOutcome {
        let canvas = surface.dimensions();
        let options = TextRenderOptions {
            text: content.to_string(),
            font_size: text_font_size(transform.scale(), canvas.width),
            fill: self.text_style.fill,
            stroke: self.text_style.stroke,
            stroke_width: self.text_style.stroke_width,
        };

        let (width, height) = match text_layer_size(&self.text_style.font, &options) {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to render text watermark");
                return RenderOutcome::ProductOnly;
            }
        };
        let size = WatermarkDimensions { width, height };
        let layer_origin = centered_at(transform.anchor(), &canvas, &size);

        // Rasterize only the part of the line that lands on the canvas.
        let clip = match visible_region(&layer_origin, &canvas, &size) {
            Some(clip) => clip,
            None => return RenderOutcome::Composited,
        };
        let rendered = match render_text_region(
            &self.text_style.font,
            &options,
            &clip.relative_to(layer_origin),
        ) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to render text watermark");
                return RenderOutcome::ProductOnly;
            }
        };
        let position = PlacementPosition::new(clip.x0 as i32, clip.y0 as i32);

        // Outline first so the fill sits on top of it.
        for image in [rendered.stroke, rendered.fill] {
            let layer = WatermarkLayer {
                image,
                position,
                opacity: transform.opacity(),
            };
            blend_layer(surface.image_mut(), &layer);
        }
        RenderOutcome::Composited
    }
}
