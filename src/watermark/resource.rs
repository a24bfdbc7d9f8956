//! Image resources and their asynchronous loader.
//!
//! An [`ImageResource`] is the handle the composition state holds for the
//! product mockup and for an image watermark. It is created pending when a
//! source [`Locator`] is assigned and becomes ready once the bytes behind the
//! locator have been fetched and decoded.
//!
//! Loads are tagged with a [`LoadTicket`] naming the locator they were
//! started for. The owner commits a finished load only if its slot still
//! holds that locator, so a slow load for a superseded source can never
//! overwrite a newer one.
//!
//! # Supported Sources
//!
//! - `https://example.com/mockup.png` / `http://...` - fetched over HTTP
//! - a filesystem path - read from disk
//! - an in-memory blob (an uploaded file) - never cached
//!
//! Fetched URL and path images are cached in memory as decoded RGBA images
//! with LRU eviction and a TTL, so switching back to a mockup is instant.

use super::WatermarkError;
use bytes::Bytes;
use image::{ImageFormat, RgbaImage};
use moka::future::Cache;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_BLOB_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for the image loader.
#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    /// Maximum number of cached images.
    pub max_cache_entries: u64,
    /// Time-to-live for cached images.
    pub cache_ttl: Duration,
    /// Timeout for HTTP fetches.
    pub request_timeout: Duration,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            max_cache_entries: 16,
            cache_ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// In-memory file contents with a unique identity.
///
/// Two handles are equal only if they came from the same allocation, even
/// when their bytes match. This mirrors object URLs: every upload gets a
/// fresh locator.
#[derive(Clone)]
pub struct BlobHandle {
    id: u64,
    name: String,
    bytes: Bytes,
}

impl BlobHandle {
    /// Allocate a new handle for the given file name and bytes.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            id: NEXT_BLOB_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl PartialEq for BlobHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BlobHandle {}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// HTTP(S) URL.
    Url(String),
    /// Local filesystem path.
    Path(PathBuf),
    /// Uploaded file held in memory.
    Blob(BlobHandle),
}

impl Locator {
    /// Parse a user-supplied source string.
    ///
    /// `http://` and `https://` prefixes produce a URL locator; anything else
    /// is treated as a filesystem path.
    pub fn parse(source: &str) -> Result<Self, WatermarkError> {
        if source.trim().is_empty() {
            return Err(WatermarkError::FetchError(
                "Image source cannot be empty".to_string(),
            ));
        }

        if source.starts_with("https://") || source.starts_with("http://") {
            Ok(Locator::Url(source.to_string()))
        } else {
            Ok(Locator::Path(PathBuf::from(source)))
        }
    }

    /// Key used by the loader cache. Blobs have none.
    pub fn cache_key(&self) -> Option<String> {
        match self {
            Locator::Url(url) => Some(url.clone()),
            Locator::Path(path) => Some(format!("file://{}", path.display())),
            Locator::Blob(_) => None,
        }
    }

    /// File name hint used for format detection.
    fn name_hint(&self) -> String {
        match self {
            Locator::Url(url) => url
                .split(['?', '#'])
                .next()
                .unwrap_or(url)
                .to_string(),
            Locator::Path(path) => path.display().to_string(),
            Locator::Blob(blob) => blob.name.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Url(url) => write!(f, "{url}"),
            Locator::Path(path) => write!(f, "{}", path.display()),
            Locator::Blob(blob) => write!(f, "blob:{}/{}", blob.id, blob.name),
        }
    }
}

/// Load progress of an [`ImageResource`].
#[derive(Clone)]
pub enum LoadState {
    /// Load started, not finished yet.
    Pending,
    /// Decoded and ready to draw.
    Ready(Arc<RgbaImage>),
    /// Fetch or decode failed. The resource stays not-ready.
    Failed(String),
}

impl fmt::Debug for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Pending => write!(f, "Pending"),
            LoadState::Ready(image) => write!(f, "Ready({}x{})", image.width(), image.height()),
            LoadState::Failed(msg) => f.debug_tuple("Failed").field(msg).finish(),
        }
    }
}

/// Async-loaded image handle.
#[derive(Debug, Clone)]
pub struct ImageResource {
    locator: Locator,
    state: LoadState,
}

impl ImageResource {
    /// Create a pending resource for the given locator.
    pub fn pending(locator: Locator) -> Self {
        Self {
            locator,
            state: LoadState::Pending,
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Whether the image has been decoded and can be drawn.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready(_))
    }

    /// The decoded image, if ready.
    pub fn image(&self) -> Option<&RgbaImage> {
        match &self.state {
            LoadState::Ready(image) => Some(image.as_ref()),
            _ => None,
        }
    }

    /// Intrinsic `(width, height)` of the decoded image, if ready.
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.image().map(|image| image.dimensions())
    }

    pub(crate) fn resolve(&mut self, result: Result<Arc<RgbaImage>, WatermarkError>) {
        self.state = match result {
            Ok(image) => LoadState::Ready(image),
            Err(e) => LoadState::Failed(e.to_string()),
        };
    }
}

/// Which resource slot a load belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Product,
    Watermark,
}

/// Tag for an in-flight load: the slot and the locator it was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    slot: SlotKind,
    locator: Locator,
}

impl LoadTicket {
    pub(crate) fn new(slot: SlotKind, locator: Locator) -> Self {
        Self { slot, locator }
    }

    pub fn slot(&self) -> SlotKind {
        self.slot
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

/// Result of completing a load against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The slot still held the ticket's locator and is now ready.
    Ready,
    /// The slot still held the ticket's locator but the load failed.
    Failed,
    /// The slot had moved on to another source; the result was discarded.
    Stale,
}

/// Loader for product and watermark images with built-in caching.
#[derive(Clone)]
pub struct ImageLoader {
    cache: Cache<String, Arc<RgbaImage>>,
    http_client: reqwest::Client,
}

impl ImageLoader {
    /// Create a new image loader with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `WatermarkError::ConfigError` if the HTTP client cannot be created.
    pub fn new(config: ImageLoaderConfig) -> Result<Self, WatermarkError> {
        let cache = Cache::builder()
            .max_capacity(config.max_cache_entries)
            .time_to_live(config.cache_ttl)
            .build();

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                WatermarkError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { cache, http_client })
    }

    /// Fetch and decode the image behind a locator.
    ///
    /// URL and path images are cached after the first successful load.
    pub async fn load(&self, locator: &Locator) -> Result<Arc<RgbaImage>, WatermarkError> {
        let cache_key = locator.cache_key();

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key).await {
                tracing::debug!(locator = %locator, "image cache hit");
                return Ok(cached);
            }
        }

        let bytes = match locator {
            Locator::Url(url) => self.fetch_from_url(url).await?,
            Locator::Path(path) => tokio::fs::read(path).await.map(Bytes::from).map_err(|e| {
                WatermarkError::FetchError(format!("Failed to read {}: {e}", path.display()))
            })?,
            Locator::Blob(blob) => blob.bytes.clone(),
        };

        let name = locator.name_hint();
        let image = tokio::task::spawn_blocking(move || decode_image(&bytes, &name))
            .await
            .map_err(|e| WatermarkError::DecodeError(format!("Decode task failed: {e}")))??;
        let image = Arc::new(image);

        if let Some(key) = cache_key {
            self.cache.insert(key, image.clone()).await;
        }

        Ok(image)
    }

    async fn fetch_from_url(&self, url: &str) -> Result<Bytes, WatermarkError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| WatermarkError::FetchError(format!("HTTP fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WatermarkError::FetchError(format!(
                "HTTP request failed with status: {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| WatermarkError::FetchError(format!("Failed to read HTTP body: {e}")))
    }

    /// Check if the image behind a locator is cached.
    pub async fn is_cached(&self, locator: &Locator) -> bool {
        match locator.cache_key() {
            Some(key) => self.cache.get(&key).await.is_some(),
            None => false,
        }
    }
}

/// Source encoding of image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Raster(ImageFormat),
    Svg,
}

/// Decode raster or SVG bytes into an RGBA image.
pub fn decode_image(data: &[u8], name: &str) -> Result<RgbaImage, WatermarkError> {
    match detect_image_format(data, name)? {
        SourceFormat::Svg => rasterize_svg(data),
        SourceFormat::Raster(format) => image::load_from_memory_with_format(data, format)
            .map(|image| image.to_rgba8())
            .map_err(|e| WatermarkError::DecodeError(e.to_string())),
    }
}

/// Detect image format from bytes or filename extension.
fn detect_image_format(data: &[u8], name: &str) -> Result<SourceFormat, WatermarkError> {
    // Magic bytes first
    if let Ok(format) = image::guess_format(data) {
        return Ok(SourceFormat::Raster(format));
    }

    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "svg" => Ok(SourceFormat::Svg),
        "png" => Ok(SourceFormat::Raster(ImageFormat::Png)),
        "jpg" | "jpeg" => Ok(SourceFormat::Raster(ImageFormat::Jpeg)),
        "gif" => Ok(SourceFormat::Raster(ImageFormat::Gif)),
        "bmp" => Ok(SourceFormat::Raster(ImageFormat::Bmp)),
        "webp" => Ok(SourceFormat::Raster(ImageFormat::WebP)),
        _ if looks_like_svg(data) => Ok(SourceFormat::Svg),
        _ => Err(WatermarkError::DecodeError(format!(
            "Unsupported image format: {ext}"
        ))),
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Rasterize an SVG document at its intrinsic size.
fn rasterize_svg(data: &[u8]) -> Result<RgbaImage, WatermarkError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| WatermarkError::DecodeError(format!("Invalid SVG: {e}")))?;

    let width = (tree.size().width().ceil() as u32).max(1);
    let height = (tree.size().height().ceil() as u32).max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        WatermarkError::DecodeError(format!("Cannot allocate {width}x{height} SVG pixmap"))
    })?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::default(),
        &mut pixmap.as_mut(),
    );

    let mut rgba = pixmap.take();
    demultiply_rgba8_in_place(&mut rgba);

    RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| WatermarkError::DecodeError("SVG pixmap size mismatch".to_string()))
}

fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
