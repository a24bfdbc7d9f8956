//! A single editing session.
//!
//! [`EditorSession`] owns the composition state, the canvas surface and the
//! components that read or write them. Every mutation re-renders the surface
//! before returning, so the surface always reflects the current state.
//!
//! # Example
//!
//! ```ignore
//! use brandmark::config::Config;
//! use brandmark::session::EditorSession;
//! use brandmark::watermark::WatermarkFile;
//!
//! let mut session = EditorSession::new(Config::default())?;
//! let ticket = session.select_product("Paper Stack")?;
//! session.load(ticket).await;
//! session.ingest(WatermarkFile::new("brand.txt", "Sample Co.")).await?;
//! session.set_opacity(0.8);
//! let path = session.download(Path::new("out")).await?;
//! ```

use crate::config::{Config, ProductEntry};
use crate::error::{Error, Result};
use crate::export::{Artifact, Exporter};
use crate::submit::{ScanResult, SubmissionStatus, Submitter};
use crate::watermark::{
    Anchor, CompositionState, ElementRect, ImageLoader, Ingested, LoadOutcome, LoadTicket,
    Locator, PointerController, PointerEvent, RenderOutcome, Renderer, Surface,
    WatermarkDescriptor, WatermarkError, WatermarkFile, WatermarkIngestor,
};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the preview area shows besides the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStatus {
    /// No watermark assigned yet.
    AwaitingWatermark,
    /// The canvas shows the composited watermark (or will once it loads).
    Composited,
    /// A raw file will be uploaded; there is nothing to preview.
    Passthrough,
}

impl PreviewStatus {
    /// Hint shown over the canvas, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::AwaitingWatermark => Some("Upload a watermark image or text file to begin"),
            Self::Composited => None,
            Self::Passthrough => Some("No preview available, the raw file will be uploaded"),
        }
    }
}

pub struct EditorSession {
    config: Config,
    state: CompositionState,
    surface: Surface,
    renderer: Renderer,
    pointer: PointerController,
    ingestor: WatermarkIngestor,
    loader: ImageLoader,
    exporter: Exporter,
    submitter: Submitter,
    status: SubmissionStatus,
    product_label: Option<String>,
}

impl EditorSession {
    /// Build a session from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let renderer = Renderer::new(config.text.to_text_style()?);
        let loader = ImageLoader::new(config.loader.to_loader_config())?;
        let submitter = Submitter::new(config.submit.clone())?;

        Ok(Self {
            state: CompositionState::new(),
            surface: Surface::new(config.canvas.width, config.canvas.height),
            renderer,
            pointer: PointerController::new(),
            ingestor: WatermarkIngestor::new(config.ingest.clone()),
            loader,
            exporter: Exporter::new(config.export.clone()),
            submitter,
            status: SubmissionStatus::Idle,
            product_label: None,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &CompositionState {
        &self.state
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    pub fn submission_status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Product catalog from the configuration.
    pub fn products(&self) -> &[ProductEntry] {
        &self.config.products
    }

    /// Label of the catalog entry currently shown, if it came from the catalog.
    pub fn product_label(&self) -> Option<&str> {
        self.product_label.as_deref()
    }

    pub fn preview_status(&self) -> PreviewStatus {
        match self.state.watermark() {
            WatermarkDescriptor::None => PreviewStatus::AwaitingWatermark,
            WatermarkDescriptor::Passthrough { .. } => PreviewStatus::Passthrough,
            WatermarkDescriptor::Image { .. } | WatermarkDescriptor::Text { .. } => {
                PreviewStatus::Composited
            }
        }
    }

    /// Redraw the surface from the current state.
    pub fn render(&mut self) -> RenderOutcome {
        self.renderer.render(&self.state, &mut self.surface)
    }

    /// Switch to a catalog product by label.
    pub fn select_product(&mut self, label: &str) -> Result<LoadTicket> {
        let source = self
            .config
            .products
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.source.clone())
            .ok_or_else(|| Error::UnknownProduct(label.to_string()))?;

        let ticket = self.set_product_source(&source)?;
        self.product_label = Some(label.to_string());
        Ok(ticket)
    }

    /// Switch to an arbitrary product path or URL.
    pub fn set_product_source(&mut self, source: &str) -> Result<LoadTicket> {
        let locator = Locator::parse(source)?;
        tracing::debug!(locator = %locator, "Product source assigned");
        self.product_label = None;
        let ticket = self.state.begin_product(locator);
        self.render();
        Ok(ticket)
    }

    /// Commit (or discard) a finished load and re-render.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: std::result::Result<Arc<RgbaImage>, WatermarkError>,
    ) -> LoadOutcome {
        let error = result.as_ref().err().map(|e| e.to_string());
        let outcome = self.state.complete_load(ticket, result);

        match outcome {
            LoadOutcome::Stale => {
                tracing::debug!(
                    slot = ?ticket.slot(),
                    locator = %ticket.locator(),
                    "Discarding stale image load"
                );
            }
            LoadOutcome::Failed => {
                tracing::warn!(
                    slot = ?ticket.slot(),
                    locator = %ticket.locator(),
                    error = error.as_deref().unwrap_or_default(),
                    "Image failed to load"
                );
            }
            LoadOutcome::Ready => {
                tracing::debug!(slot = ?ticket.slot(), locator = %ticket.locator(), "Image ready");
                self.render();
            }
        }
        outcome
    }

    /// Fetch and decode the ticket's image, then complete it.
    pub async fn load(&mut self, ticket: LoadTicket) -> LoadOutcome {
        let result = self.loader.load(ticket.locator()).await;
        self.complete_load(&ticket, result)
    }

    /// Assign a product source and wait for it to load.
    pub async fn load_product(&mut self, source: &str) -> Result<LoadOutcome> {
        let ticket = self.set_product_source(source)?;
        Ok(self.load(ticket).await)
    }

    /// Ingest a watermark file. Image watermarks are loaded before returning.
    pub async fn ingest(&mut self, file: WatermarkFile) -> Result<Ingested> {
        let ingested = self.ingestor.ingest(file, &mut self.state)?;
        self.render();

        if let Ingested::Image(ticket) = &ingested {
            self.load(ticket.clone()).await;
        }
        Ok(ingested)
    }

    /// Read a file from disk and ingest it.
    pub async fn ingest_path(&mut self, path: &Path) -> Result<Ingested> {
        let file = WatermarkFile::from_path(path).await?;
        self.ingest(file).await
    }

    /// Set opacity; non-finite input is ignored.
    pub fn set_opacity(&mut self, opacity: f32) -> bool {
        let changed = self.state.transform_mut().set_opacity(opacity);
        if changed {
            self.render();
        }
        changed
    }

    /// Set scale; non-finite input is ignored.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        let changed = self.state.transform_mut().set_scale(scale);
        if changed {
            self.render();
        }
        changed
    }

    pub fn set_anchor(&mut self, x: f32, y: f32) {
        self.state.transform_mut().set_anchor(Anchor::new(x, y));
        self.render();
    }

    /// Restore default opacity, scale and anchor. The watermark is kept.
    pub fn reset_transform(&mut self) {
        self.state.reset_transform();
        self.render();
    }

    /// Feed a pointer event from the canvas element.
    pub fn pointer(&mut self, event: PointerEvent, rect: &ElementRect) -> Option<Anchor> {
        let anchor = self.pointer.handle(event, rect)?;
        self.state.transform_mut().set_anchor(anchor);
        self.render();
        Some(anchor)
    }

    pub fn is_dragging(&self) -> bool {
        self.pointer.is_dragging()
    }

    /// The file a download or upload would produce right now.
    pub fn artifact(&self) -> Result<Artifact> {
        Ok(self.exporter.artifact(&self.state, &self.surface)?)
    }

    /// Write the current artifact into `dir` and return its path.
    pub async fn download(&self, dir: &Path) -> Result<PathBuf> {
        let artifact = self.artifact()?;
        let path = artifact.write_to(dir).await?;
        tracing::info!(
            path = %path.display(),
            bytes = artifact.bytes.len(),
            "Artifact saved"
        );
        Ok(path)
    }

    /// Upload the current artifact.
    ///
    /// A failure is recorded in the submission status and leaves the
    /// composition untouched, so the caller can simply retry.
    pub async fn submit(&mut self, protection: bool) -> Result<ScanResult> {
        self.status = SubmissionStatus::Submitting;

        let result = match self.artifact() {
            Ok(artifact) => self
                .submitter
                .submit(&artifact, protection)
                .await
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        self.status = match &result {
            Ok(scan) => SubmissionStatus::Succeeded(scan.clone()),
            Err(e) => SubmissionStatus::Failed(e.to_string()),
        };
        result
    }
}
