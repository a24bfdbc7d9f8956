//! Watermark compositing on top of product mockups.
//!
//! A [`CompositionState`] holds the product image, the current watermark and
//! its transform. The [`Renderer`] turns that state into pixels on an
//! explicit [`Surface`]; [`PointerController`] and [`WatermarkIngestor`] are
//! the two ways the state changes besides plain setters.
//!
//! # Features
//!
//! - **Image watermarks** (raster formats and SVG) sized relative to the canvas width
//! - **Text watermarks** with a white fill and dark outline
//! - **Pass-through files** that skip compositing and are uploaded as-is
//! - **Stale-load guard**: a finished load only commits if its slot still
//!   holds the locator the load was started for
//!
//! # Example
//!
//! ```ignore
//! use brandmark::watermark::*;
//!
//! let mut state = CompositionState::new();
//! let ticket = state.begin_product(Locator::parse("images/paper_products.png")?);
//! let image = loader.load(ticket.locator()).await;
//! state.complete_load(&ticket, image);
//!
//! let mut surface = Surface::new(1000, 650);
//! Renderer::new(TextStyle::default_font()?).render(&state, &mut surface);
//! ```

pub mod compositor;
pub mod error;
pub mod ingest;
pub mod pointer;
pub mod position;
pub mod renderer;
pub mod resource;
pub mod state;
pub mod surface;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{blend_layer, blend_pixels, draw_scaled, draw_stretched, WatermarkLayer};
pub use error::WatermarkError;
pub use ingest::{
    extension_of, sanitize_filename, FileClass, IngestMode, IngestPolicy, Ingested,
    WatermarkFile, WatermarkIngestor,
};
pub use pointer::{DragState, ElementRect, PointerController, PointerEvent, PointerEventKind};
pub use position::{
    anchor_point, centered_at, target_size, target_width, visible_region, ClipRect,
    ImageDimensions, PlacementPosition, WatermarkDimensions,
};
pub use renderer::{text_font_size, RenderOutcome, Renderer, TextStyle};
pub use resource::{
    decode_image, BlobHandle, ImageLoader, ImageLoaderConfig, ImageResource, LoadOutcome,
    LoadState, LoadTicket, Locator, SlotKind,
};
pub use state::{Anchor, CompositionState, Transform, WatermarkDescriptor};
pub use surface::Surface;
pub use text_renderer::{
    default_font, load_font, measure_text, parse_hex_color, render_text_region, text_layer_size,
    Color, RenderedText, TextRenderOptions,
};
