// Error types module

use crate::config::ConfigError;
use crate::submit::SubmitError;
use crate::watermark::WatermarkError;
use thiserror::Error;

/// Top-level error for the editing session and the binary.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("Unknown product '{0}'")]
    UnknownProduct(String),
}

pub type Result<T> = std::result::Result<T, Error>;
