//! Watermark file ingestion.
//!
//! Files are classified purely by the lower-cased suffix after the last `.`
//! in their name. The bytes are never inspected to decide the variant.
//!
//! What happens to a file whose extension is not recognized is a policy
//! choice:
//!
//! - `restricted` rejects it at the input boundary
//! - `permissive` keeps it as a pass-through upload with no preview
//!
//! # Configuration Example
//!
//! ```yaml
//! ingest:
//!   mode: permissive
//!   text_extensions: [txt]
//!   image_extensions: [jpg, jpeg, png, gif, bmp, webp, svg]
//!   sanitize_filenames: false
//!   max_file_bytes: null
//! ```

use super::resource::{BlobHandle, LoadTicket, Locator};
use super::state::CompositionState;
use super::WatermarkError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const MAX_FILENAME_LENGTH: usize = 255;

/// Fallback for files that match neither extension list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Only image and text files are accepted.
    #[default]
    Restricted,
    /// Anything else becomes a pass-through upload.
    Permissive,
}

/// Ingestion policy. Extension lists are lower-case and dot-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestPolicy {
    #[serde(default)]
    pub mode: IngestMode,

    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Strip path components and unusual characters from file names.
    #[serde(default)]
    pub sanitize_filenames: bool,

    /// Reject files larger than this many bytes.
    #[serde(default)]
    pub max_file_bytes: Option<u64>,
}

fn default_text_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self::restricted()
    }
}

impl IngestPolicy {
    /// Images and text only; everything else is rejected.
    pub fn restricted() -> Self {
        Self {
            mode: IngestMode::Restricted,
            text_extensions: default_text_extensions(),
            image_extensions: default_image_extensions(),
            sanitize_filenames: false,
            max_file_bytes: None,
        }
    }

    /// Images and text are composited; anything else passes through.
    pub fn permissive() -> Self {
        Self {
            mode: IngestMode::Permissive,
            ..Self::restricted()
        }
    }

    /// Validate the policy.
    pub fn validate(&self) -> Result<(), String> {
        for ext in self.text_extensions.iter().chain(&self.image_extensions) {
            if ext.is_empty() {
                return Err("Extensions cannot be empty".to_string());
            }
            if ext.contains('.') {
                return Err(format!("Extension '{}' must not contain a dot", ext));
            }
            if ext.to_lowercase() != *ext {
                return Err(format!("Extension '{}' must be lower-case", ext));
            }
        }

        let text: HashSet<&str> = self.text_extensions.iter().map(String::as_str).collect();
        if let Some(both) = self
            .image_extensions
            .iter()
            .find(|ext| text.contains(ext.as_str()))
        {
            return Err(format!(
                "Extension '{}' is listed as both text and image",
                both
            ));
        }

        if self.max_file_bytes == Some(0) {
            return Err("max_file_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Classify a file name by its extension.
    pub fn classify(&self, filename: &str) -> FileClass {
        match extension_of(filename) {
            Some(ext) if self.text_extensions.contains(&ext) => FileClass::Text,
            Some(ext) if self.image_extensions.contains(&ext) => FileClass::Image,
            _ => FileClass::Unrecognized,
        }
    }
}

/// Result of extension classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Text,
    Image,
    Unrecognized,
}

/// Lower-cased suffix after the last `.`, if there is a non-empty one.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, WatermarkError> {
    let path = Path::new(filename);
    if path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(WatermarkError::RejectedFile(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(WatermarkError::RejectedFile(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

/// A file handed to the ingestor.
#[derive(Debug, Clone)]
pub struct WatermarkFile {
    pub name: String,
    pub bytes: Bytes,
}

impl WatermarkFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, named after its final path component.
    pub async fn from_path(path: &Path) -> Result<Self, WatermarkError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| WatermarkError::ReadError(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// What an ingestion assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    Text,
    /// Image watermark whose load must be driven with the ticket.
    Image(LoadTicket),
    Passthrough,
}

/// Routes incoming files into the composition state.
#[derive(Debug, Clone, Default)]
pub struct WatermarkIngestor {
    policy: IngestPolicy,
}

impl WatermarkIngestor {
    pub fn new(policy: IngestPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IngestPolicy {
        &self.policy
    }

    /// Classify `file` and assign the matching watermark variant.
    ///
    /// A rejected file leaves the state untouched.
    pub fn ingest(
        &self,
        file: WatermarkFile,
        state: &mut CompositionState,
    ) -> Result<Ingested, WatermarkError> {
        if let Some(limit) = self.policy.max_file_bytes {
            if file.bytes.len() as u64 > limit {
                tracing::warn!(
                    filename = %file.name,
                    size = file.bytes.len(),
                    limit,
                    "Watermark file exceeds size limit"
                );
                return Err(WatermarkError::RejectedFile(format!(
                    "'{}' is {} bytes, limit is {}",
                    file.name,
                    file.bytes.len(),
                    limit
                )));
            }
        }

        let class = self.policy.classify(&file.name);
        let name = if self.policy.sanitize_filenames {
            sanitize_filename(&file.name)?
        } else {
            file.name
        };

        match class {
            FileClass::Text => {
                let content = String::from_utf8_lossy(&file.bytes).trim().to_string();
                tracing::info!(filename = %name, chars = content.chars().count(), "Text watermark assigned");
                state.set_text(content, Some(name));
                Ok(Ingested::Text)
            }
            FileClass::Image => {
                let locator = Locator::Blob(BlobHandle::new(name.clone(), file.bytes));
                tracing::info!(filename = %name, "Image watermark assigned");
                let ticket = state.begin_watermark_image(locator, Some(name));
                Ok(Ingested::Image(ticket))
            }
            FileClass::Unrecognized => match self.policy.mode {
                IngestMode::Permissive => {
                    tracing::info!(filename = %name, "Unrecognized file kept as pass-through");
                    state.set_passthrough(file.bytes, name);
                    Ok(Ingested::Passthrough)
                }
                IngestMode::Restricted => {
                    tracing::warn!(filename = %name, "Unrecognized watermark file rejected");
                    Err(WatermarkError::RejectedFile(format!(
                        "'{}' is not an image or text file",
                        name
                    )))
                }
            },
        }
    }
}
