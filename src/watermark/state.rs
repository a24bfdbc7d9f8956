//! Composition state: the single source of truth for what gets rendered.
//!
//! Every field is clamped to its range when it is written, never when it is
//! read. Resetting restores the transform only; the watermark stays.

use super::resource::{ImageResource, LoadOutcome, LoadTicket, Locator, SlotKind};
use super::WatermarkError;
use bytes::Bytes;
use image::RgbaImage;
use std::sync::Arc;

pub const DEFAULT_OPACITY: f32 = 0.5;
pub const DEFAULT_SCALE: f32 = 0.3;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 0.9;

/// Normalized position on the canvas where the watermark is centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor { x: 0.5, y: 0.5 };

    /// Create an anchor, clamping both axes to `[0, 1]`.
    ///
    /// A non-finite axis falls back to the center.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x, Self::CENTER.x),
            y: clamp_unit(y, Self::CENTER.y),
        }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

fn clamp_unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Opacity, scale and anchor of the watermark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    opacity: f32,
    scale: f32,
    anchor: Anchor,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            scale: DEFAULT_SCALE,
            anchor: Anchor::CENTER,
        }
    }
}

impl Transform {
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Fraction of the canvas width used as the target watermark width.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Set opacity, clamped to `[0, 1]`. Non-finite values are ignored.
    ///
    /// Returns whether the value was applied.
    pub fn set_opacity(&mut self, opacity: f32) -> bool {
        if !opacity.is_finite() {
            return false;
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        true
    }

    /// Set scale, clamped to `[0.1, 0.9]`. Non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        if !scale.is_finite() {
            return false;
        }
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        true
    }

    /// Set the anchor. [`Anchor::new`] has already clamped it.
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = Anchor::new(anchor.x, anchor.y);
    }
}

/// The watermark currently assigned to the composition.
#[derive(Debug, Clone, Default)]
pub enum WatermarkDescriptor {
    /// Nothing assigned yet.
    #[default]
    None,
    /// Raster or SVG image overlay.
    Image { resource: ImageResource },
    /// Line of text drawn with fill and outline stroke.
    Text { content: String },
    /// Non-raster file uploaded as-is; nothing is composited.
    Passthrough {
        raw_file: Bytes,
        original_filename: String,
    },
}

impl WatermarkDescriptor {
    /// Short variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
            Self::Passthrough { .. } => "passthrough",
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough { .. })
    }
}

/// Product mockup, watermark and transform of one editing session.
#[derive(Debug, Clone, Default)]
pub struct CompositionState {
    product: Option<ImageResource>,
    watermark: WatermarkDescriptor,
    watermark_name: Option<String>,
    transform: Transform,
}

impl CompositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(&self) -> Option<&ImageResource> {
        self.product.as_ref()
    }

    pub fn watermark(&self) -> &WatermarkDescriptor {
        &self.watermark
    }

    /// Name of the file the current watermark was ingested from.
    pub fn watermark_name(&self) -> Option<&str> {
        self.watermark_name.as_deref()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Restore the default transform. The watermark is left untouched.
    pub fn reset_transform(&mut self) {
        self.transform = Transform::default();
    }

    /// Assign a new product source, superseding the previous resource.
    ///
    /// The returned ticket must be handed to [`complete_load`](Self::complete_load)
    /// with the load result.
    pub fn begin_product(&mut self, locator: Locator) -> LoadTicket {
        self.product = Some(ImageResource::pending(locator.clone()));
        LoadTicket::new(SlotKind::Product, locator)
    }

    /// Assign an image watermark, superseding whatever watermark was set.
    pub fn begin_watermark_image(&mut self, locator: Locator, name: Option<String>) -> LoadTicket {
        self.watermark = WatermarkDescriptor::Image {
            resource: ImageResource::pending(locator.clone()),
        };
        self.watermark_name = name;
        LoadTicket::new(SlotKind::Watermark, locator)
    }

    /// Assign a text watermark. Any image resource reference is dropped, so
    /// a still-running image load for it becomes stale.
    pub fn set_text(&mut self, content: impl Into<String>, name: Option<String>) {
        self.watermark = WatermarkDescriptor::Text {
            content: content.into(),
        };
        self.watermark_name = name;
    }

    /// Assign a pass-through file that bypasses compositing.
    pub fn set_passthrough(&mut self, raw_file: Bytes, original_filename: impl Into<String>) {
        let original_filename = original_filename.into();
        self.watermark_name = Some(original_filename.clone());
        self.watermark = WatermarkDescriptor::Passthrough {
            raw_file,
            original_filename,
        };
    }

    /// Commit a finished load if its slot still holds the ticket's locator.
    ///
    /// Anything else is stale and discarded without touching state.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Arc<RgbaImage>, WatermarkError>,
    ) -> LoadOutcome {
        let slot = match ticket.slot() {
            SlotKind::Product => self.product.as_mut(),
            SlotKind::Watermark => match &mut self.watermark {
                WatermarkDescriptor::Image { resource } => Some(resource),
                _ => None,
            },
        };

        let resource = match slot {
            Some(resource) if resource.locator() == ticket.locator() => resource,
            _ => return LoadOutcome::Stale,
        };

        let failed = result.is_err();
        resource.resolve(result);
        if failed {
            LoadOutcome::Failed
        } else {
            LoadOutcome::Ready
        }
    }
}
