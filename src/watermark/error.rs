//! Watermark error types.
//!
//! Defines errors that can occur while loading, ingesting and rendering
//! watermark compositions.

use std::fmt;

/// Errors that can occur during watermark processing.
#[derive(Debug, Clone)]
pub enum WatermarkError {
    /// Failed to fetch image bytes from their source
    FetchError(String),

    /// Failed to decode image bytes
    DecodeError(String),

    /// Failed to render text
    RenderError(String),

    /// Failed to read an ingested file
    ReadError(String),

    /// Failed to encode the canvas surface
    EncodeError(String),

    /// File refused by the active ingestion policy
    RejectedFile(String),

    /// Invalid configuration
    ConfigError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchError(msg) => write!(f, "Failed to fetch image: {}", msg),
            Self::DecodeError(msg) => write!(f, "Failed to decode image: {}", msg),
            Self::RenderError(msg) => write!(f, "Failed to render text watermark: {}", msg),
            Self::ReadError(msg) => write!(f, "Failed to read watermark file: {}", msg),
            Self::EncodeError(msg) => write!(f, "Failed to encode canvas: {}", msg),
            Self::RejectedFile(msg) => write!(f, "Watermark file rejected: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}
