//! Canvas export.
//!
//! Serializes whatever the renderer last drew on the [`Surface`] into PNG
//! bytes, and pairs them with the file name used for downloads and uploads.
//! Pass-through watermarks skip encoding entirely: the original bytes and
//! file name are used unmodified.

use crate::watermark::{CompositionState, Surface, WatermarkDescriptor, WatermarkError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const PNG_CONTENT_TYPE: &str = "image/png";
pub const OCTET_STREAM_CONTENT_TYPE: &str = "application/octet-stream";

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Base name used when no watermark file name is available.
    #[serde(default = "default_basename")]
    pub default_basename: String,
}

fn default_basename() -> String {
    "boring-paper-watermarked".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_basename: default_basename(),
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.default_basename.trim();
        if name.is_empty() {
            return Err("export.default_basename cannot be empty".to_string());
        }
        if name.contains('/') || name.contains('\\') {
            return Err("export.default_basename cannot contain path separators".to_string());
        }
        Ok(())
    }
}

/// A file ready to be downloaded or uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Bytes,
    pub content_type: &'static str,
}

impl Artifact {
    /// Whether the bytes are an encoded canvas rather than a raw file.
    pub fn is_png(&self) -> bool {
        self.content_type == PNG_CONTENT_TYPE
    }

    /// Write the artifact to `dir/<filename>` and return the full path.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, WatermarkError> {
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.bytes)
            .await
            .map_err(|e| WatermarkError::EncodeError(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }
}

/// Encodes the surface and names the result.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Encode the current surface pixels as PNG.
    ///
    /// A surface nothing has been drawn on yet encodes as a blank PNG.
    pub fn to_png(&self, surface: &Surface) -> Result<Bytes, WatermarkError> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder as _;

        let pixels = surface.image();
        let mut output = Cursor::new(Vec::new());
        PngEncoder::new(&mut output)
            .write_image(
                pixels.as_raw(),
                pixels.width(),
                pixels.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| WatermarkError::EncodeError(e.to_string()))?;

        Ok(Bytes::from(output.into_inner()))
    }

    /// PNG bytes for a local download.
    pub fn to_downloadable_image(&self, surface: &Surface) -> Result<Bytes, WatermarkError> {
        self.to_png(surface)
    }

    /// PNG bytes for a multipart upload.
    pub fn to_uploadable_blob(&self, surface: &Surface) -> Result<Bytes, WatermarkError> {
        self.to_png(surface)
    }

    /// `<basename of the watermark file>.png`, or the configured default.
    ///
    /// Pass-through watermarks keep their original file name.
    pub fn derived_filename(&self, state: &CompositionState) -> String {
        if let WatermarkDescriptor::Passthrough {
            original_filename, ..
        } = state.watermark()
        {
            return original_filename.clone();
        }

        let stem = state
            .watermark_name()
            .map(file_stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(self.config.default_basename.as_str());
        format!("{}.png", stem)
    }

    /// Build the download/upload artifact for the current state.
    pub fn artifact(
        &self,
        state: &CompositionState,
        surface: &Surface,
    ) -> Result<Artifact, WatermarkError> {
        if let WatermarkDescriptor::Passthrough {
            raw_file,
            original_filename,
        } = state.watermark()
        {
            return Ok(Artifact {
                filename: original_filename.clone(),
                bytes: raw_file.clone(),
                content_type: OCTET_STREAM_CONTENT_TYPE,
            });
        }

        Ok(Artifact {
            filename: self.derived_filename(state),
            bytes: self.to_png(surface)?,
            content_type: PNG_CONTENT_TYPE,
        })
    }
}

/// Final path component with the last extension removed.
fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => base,
    }
}
