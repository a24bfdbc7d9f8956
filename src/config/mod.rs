// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::export::ExportConfig;
use crate::logging::LoggingConfig;
use crate::submit::SubmitConfig;
use crate::watermark::{
    load_font, parse_hex_color, text_renderer, IngestPolicy, ImageLoaderConfig, TextStyle,
    WatermarkError,
};

/// Upper bound for the text outline width in pixels.
pub const MAX_STROKE_WIDTH: f32 = 16.0;

/// Largest accepted canvas side in pixels.
pub const MAX_CANVAS_DIMENSION: u32 = 16384;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas: CanvasConfig,
    pub products: Vec<ProductEntry>,
    pub text: TextConfig,
    pub ingest: IngestPolicy,
    pub export: ExportConfig,
    pub submit: SubmitConfig,
    pub loader: LoaderConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            products: default_products(),
            text: TextConfig::default(),
            ingest: IngestPolicy::default(),
            export: ExportConfig::default(),
            submit: SubmitConfig::default(),
            loader: LoaderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Fixed logical resolution of the canvas surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    #[serde(default = "default_canvas_height")]
    pub height: u32,
}

fn default_canvas_width() -> u32 {
    1000
}

fn default_canvas_height() -> u32 {
    650
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

/// One product mockup in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    pub label: String,
    /// File path or http(s) URL.
    pub source: String,
}

impl ProductEntry {
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
        }
    }
}

fn default_products() -> Vec<ProductEntry> {
    vec![
        ProductEntry::new("Paper Stack", "images/paper_products.png"),
        ProductEntry::new("Paper Products (Alt)", "images/paper_products_1.png"),
        ProductEntry::new("Paper Hero", "images/paper-hero.jpg"),
        ProductEntry::new("Files", "images/files.png"),
    ]
}

/// Text watermark styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(default = "default_fill_color")]
    pub fill_color: String,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    /// TrueType/OpenType font file; the embedded font is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

fn default_fill_color() -> String {
    "#FFFFFF".to_string()
}

fn default_stroke_color() -> String {
    "#000000".to_string()
}

fn default_stroke_width() -> f32 {
    2.0
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            fill_color: default_fill_color(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            font_path: None,
        }
    }
}

impl TextConfig {
    /// Resolve colors and load the font.
    pub fn to_text_style(&self) -> Result<TextStyle, WatermarkError> {
        let font = match &self.font_path {
            Some(path) => load_font(path)?,
            None => text_renderer::default_font()?,
        };
        Ok(TextStyle {
            font,
            fill: parse_hex_color(&self.fill_color)?,
            stroke: parse_hex_color(&self.stroke_color)?,
            stroke_width: self.stroke_width,
        })
    }
}

/// Image loader cache and fetch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: u64,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_max_cache_entries() -> u64 {
    16
}

fn default_cache_ttl_seconds() -> u64 {
    3600
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_cache_entries: default_max_cache_entries(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl LoaderConfig {
    pub fn to_loader_config(&self) -> ImageLoaderConfig {
        ImageLoaderConfig {
            max_cache_entries: self.max_cache_entries,
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            request_timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });
        if let Some(var_name) = missing {
            return Err(ConfigError::MissingEnvVar(var_name));
        }

        // An empty document (or one with only comments) means all defaults
        let value: serde_yaml::Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if value.is_null() {
            return Ok(Config::default());
        }
        serde_yaml::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_inner().map_err(ConfigError::Invalid)
    }

    fn validate_inner(&self) -> Result<(), String> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(format!(
                "Canvas dimensions must be at least 1x1, got {}x{}",
                self.canvas.width, self.canvas.height
            ));
        }
        if self.canvas.width > MAX_CANVAS_DIMENSION || self.canvas.height > MAX_CANVAS_DIMENSION {
            return Err(format!(
                "Canvas dimensions cannot exceed {0}x{0}, got {1}x{2}",
                MAX_CANVAS_DIMENSION, self.canvas.width, self.canvas.height
            ));
        }

        let mut seen_labels = HashSet::new();
        for product in &self.products {
            if product.label.trim().is_empty() {
                return Err("Product label cannot be empty".to_string());
            }
            if product.source.trim().is_empty() {
                return Err(format!("Product '{}' has an empty source", product.label));
            }
            if !seen_labels.insert(product.label.as_str()) {
                return Err(format!("Duplicate product label '{}'", product.label));
            }
        }

        for (field, color) in [
            ("text.fill_color", &self.text.fill_color),
            ("text.stroke_color", &self.text.stroke_color),
        ] {
            parse_hex_color(color).map_err(|e| format!("{}: {}", field, e))?;
        }

        if !self.text.stroke_width.is_finite()
            || self.text.stroke_width < 0.0
            || self.text.stroke_width > MAX_STROKE_WIDTH
        {
            return Err(format!(
                "text.stroke_width must be between 0 and {}, got {}",
                MAX_STROKE_WIDTH, self.text.stroke_width
            ));
        }

        if self.loader.max_cache_entries == 0 {
            return Err("loader.max_cache_entries must be greater than 0".to_string());
        }
        if self.loader.timeout_seconds == 0 {
            return Err("loader.timeout_seconds must be greater than 0".to_string());
        }

        self.ingest.validate()?;
        self.export.validate()?;
        self.submit.validate()?;
        self.logging.validate()?;

        Ok(())
    }
}
