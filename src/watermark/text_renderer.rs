//! Text watermark rendering.
//!
//! This module rasterizes a single line of text into two RGBA layers, an
//! outline stroke and a solid fill, which the renderer composites onto the
//! surface stroke first.
//!
//! The full layer size comes from [`text_layer_size`] without rasterizing
//! anything. [`render_text_region`] then draws just a window of that layer,
//! which is how the renderer keeps arbitrarily long lines bounded by the
//! canvas size.
//!
//! # Features
//!
//! - Hex color parsing (#RGB and #RRGGBB formats)
//! - Outline stroke of configurable width
//! - Embedded default font, or any TrueType/OpenType file from disk
//!
//! # Example
//!
//! ```ignore
//! use brandmark::watermark::text_renderer::{default_font, render_text_region, text_layer_size};
//!
//! let options = TextRenderOptions {
//!     text: "Sample Co.".to_string(),
//!     font_size: 24.0,
//!     ..Default::default()
//! };
//!
//! let font = default_font()?;
//! let (width, height) = text_layer_size(&font, &options)?;
//! let rendered = render_text_region(&font, &options, &ClipRect::full(width, height))?;
//! assert_eq!(rendered.fill.dimensions(), rendered.stroke.dimensions());
//! ```

use super::position::ClipRect;
use super::WatermarkError;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::OnceLock;

static DEFAULT_FONT: OnceLock<Result<FontArc, String>> = OnceLock::new();

/// Embedded font data (DejaVu Sans, see fonts/LICENSE).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

/// Get the embedded font, initializing it lazily.
pub fn default_font() -> Result<FontArc, WatermarkError> {
    DEFAULT_FONT
        .get_or_init(|| FontArc::try_from_slice(EMBEDDED_FONT_DATA).map_err(|e| e.to_string()))
        .clone()
        .map_err(|e| WatermarkError::RenderError(format!("Failed to load embedded font: {}", e)))
}

/// Load a font file from disk.
pub fn load_font(path: &Path) -> Result<FontArc, WatermarkError> {
    let data = std::fs::read(path).map_err(|e| {
        WatermarkError::ConfigError(format!("Failed to read font {}: {}", path.display(), e))
    })?;
    FontArc::try_from_vec(data).map_err(|e| {
        WatermarkError::ConfigError(format!("Invalid font {}: {}", path.display(), e))
    })
}

/// Parsed RGB color from hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

/// Options for text rendering.
#[derive(Debug, Clone)]
pub struct TextRenderOptions {
    /// The text to render. Line breaks are drawn as spaces.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Glyph fill color.
    pub fill: Color,
    /// Outline color.
    pub stroke: Color,
    /// Outline width in pixels, centered on the glyph edge. Zero disables
    /// the outline.
    pub stroke_width: f32,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 24.0,
            fill: Color::white(),
            stroke: Color::black(),
            stroke_width: 2.0,
        }
    }
}

/// The two layers of a rendered text window. Both have the same dimensions
/// and share the same origin.
#[derive(Debug, Clone)]
pub struct RenderedText {
    pub stroke: RgbaImage,
    pub fill: RgbaImage,
}

impl RenderedText {
    pub fn width(&self) -> u32 {
        self.fill.width()
    }

    pub fn height(&self) -> u32 {
        self.fill.height()
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```ignore
/// let white = parse_hex_color("#FFF").unwrap();
/// assert_eq!(white, Color::new(255, 255, 255));
///
/// let red = parse_hex_color("#FF0000").unwrap();
/// assert_eq!(red, Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::ConfigError("Color must start with '#'".to_string()))?;

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WatermarkError::ConfigError(format!(
            "Invalid hex digit in color '#{}'",
            hex
        )));
    }

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::ConfigError("Invalid hex digit".to_string()))
    };

    match hex.len() {
        // Double each component: 0xF -> 0xFF, 0xA -> 0xAA
        3 => Ok(Color::new(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(WatermarkError::ConfigError(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// Collapse line breaks and tabs so the content draws as one line.
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Calculate the dimensions of rendered text, without outline padding.
///
/// Returns (width, height) in pixels.
pub fn measure_text(font: &FontArc, text: &str, font_size: f32) -> (u32, u32) {
    let scaled_font = font.as_scaled(PxScale::from(font_size));

    let mut width = 0.0f64;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id) as f64;
        }

        width += scaled_font.h_advance(glyph_id) as f64;
        prev_glyph = Some(glyph_id);
    }

    let height = scaled_font.height();

    // Add small padding; saturates for absurdly long lines
    let padding = 2;
    (
        (width.max(0.0).ceil() as u32).saturating_add(padding),
        (height.ceil() as u32).saturating_add(padding),
    )
}

fn validate(options: &TextRenderOptions) -> Result<String, WatermarkError> {
    let text = single_line(&options.text);
    if text.trim().is_empty() {
        return Err(WatermarkError::RenderError(
            "Cannot render empty text".to_string(),
        ));
    }
    if !options.font_size.is_finite() || options.font_size <= 0.0 {
        return Err(WatermarkError::RenderError(format!(
            "Invalid font size {}",
            options.font_size
        )));
    }
    Ok(text)
}

/// Room left around the glyphs for the outline.
fn outline_pad(options: &TextRenderOptions) -> u32 {
    (options.stroke_width.max(0.0) / 2.0).ceil() as u32
}

/// Full `(width, height)` of the text layer, outline padding included.
///
/// The text's middle is the middle of this layer, so centering the layer on
/// a point centers the text there.
pub fn text_layer_size(
    font: &FontArc,
    options: &TextRenderOptions,
) -> Result<(u32, u32), WatermarkError> {
    let text = validate(options)?;
    let pad = outline_pad(options).saturating_mul(2);
    let (width, height) = measure_text(font, &text, options.font_size);
    Ok((width.saturating_add(pad), height.saturating_add(pad)))
}

/// Render the `region` window of the text layer into a stroke and a fill
/// image of the region's size.
///
/// `region` is in layer coordinates (see [`text_layer_size`]). Memory use
/// follows the region plus the outline reach around it, never the length
/// of the text.
pub fn render_text_region(
    font: &FontArc,
    options: &TextRenderOptions,
    region: &ClipRect,
) -> Result<RenderedText, WatermarkError> {
    let text = validate(options)?;

    let scale = PxScale::from(options.font_size);
    let scaled_font = font.as_scaled(scale);

    let radius = options.stroke_width.max(0.0) / 2.0;
    let pad = outline_pad(options);

    // Rasterize a margin around the region so the outline of glyphs just
    // outside it still reaches in.
    let buf_x0 = region.x0.saturating_sub(pad);
    let buf_y0 = region.y0.saturating_sub(pad);
    let buf_width = (region.x1.saturating_add(pad) - buf_x0) as usize;
    let buf_height = (region.y1.saturating_add(pad) - buf_y0) as usize;

    let mut coverage = vec![0.0f32; buf_width * buf_height];

    // Glyph positions are tracked in 64-bit layer space and shifted into the
    // buffer, so windows far along a long line stay pixel accurate.
    let baseline_y = pad as f64 + 1.0 + scaled_font.ascent() as f64 - buf_y0 as f64;
    let window_start = buf_x0 as f64;
    let window_end = buf_x0 as f64 + buf_width as f64;
    let reach = options.font_size as f64;

    let mut cursor_x = pad as f64 + 1.0;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id) as f64;
        }
        let advance = scaled_font.h_advance(glyph_id) as f64;

        if cursor_x > window_end + reach {
            break;
        }

        if cursor_x + advance + reach >= window_start {
            let origin = ab_glyph::point(
                (cursor_x - window_start) as f32,
                baseline_y as f32,
            );
            let glyph = glyph_id.with_scale_and_position(scale, origin);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();

                outlined.draw(|px, py, c| {
                    let x = px as i64 + bounds.min.x as i64;
                    let y = py as i64 + bounds.min.y as i64;

                    if x >= 0 && y >= 0 && (x as usize) < buf_width && (y as usize) < buf_height {
                        let idx = y as usize * buf_width + x as usize;
                        coverage[idx] = (coverage[idx] + c).min(1.0);
                    }
                });
            }
        }

        cursor_x += advance;
        prev_glyph = Some(glyph_id);
    }

    let outline = dilate(&coverage, buf_width, buf_height, radius);

    let window = Window {
        offset_x: (region.x0 - buf_x0) as usize,
        offset_y: (region.y0 - buf_y0) as usize,
        stride: buf_width,
        width: region.width(),
        height: region.height(),
    };

    Ok(RenderedText {
        stroke: window.paint(&outline, options.stroke),
        fill: window.paint(&coverage, options.fill),
    })
}

/// Grow a coverage mask outward by `radius` pixels (max filter over a disk).
fn dilate(mask: &[f32], width: usize, height: usize, radius: f32) -> Vec<f32> {
    if radius <= 0.0 {
        return vec![0.0; mask.len()];
    }

    let reach = radius.ceil() as i64;
    let limit = radius * radius + 0.5;
    let offsets: Vec<(i64, i64)> = (-reach..=reach)
        .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| ((dx * dx + dy * dy) as f32) <= limit)
        .collect();

    let (w, h) = (width as i64, height as i64);
    let mut out = vec![0.0f32; mask.len()];
    for y in 0..h {
        for x in 0..w {
            let mut best = 0.0f32;
            for (dx, dy) in &offsets {
                let sx = x + dx;
                let sy = y + dy;
                if sx < 0 || sy < 0 || sx >= w || sy >= h {
                    continue;
                }
                best = best.max(mask[(sy * w + sx) as usize]);
                if best >= 1.0 {
                    break;
                }
            }
            out[(y * w + x) as usize] = best;
        }
    }
    out
}

/// Sub-rectangle of a coverage buffer that becomes the output image.
struct Window {
    offset_x: usize,
    offset_y: usize,
    stride: usize,
    width: u32,
    height: u32,
}

impl Window {
    fn paint(&self, mask: &[f32], color: Color) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let idx = (y as usize + self.offset_y) * self.stride + x as usize + self.offset_x;
            let c = mask[idx];
            color.with_alpha((c * 255.0).round().clamp(0.0, 255.0) as u8)
        })
    }
}
