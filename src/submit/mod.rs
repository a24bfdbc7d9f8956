//! Multipart submission of the exported artifact.
//!
//! The artifact is posted as `multipart/form-data` with two fields:
//!
//! - `file`: the PNG (or the raw pass-through file) under its derived name
//! - `scanProtection`: `"true"` or `"false"`
//!
//! The endpoint path depends on whether scan protection was requested. Only
//! one submission may be in flight per [`Submitter`]; a second call made while
//! the first is pending fails fast with [`SubmitError::InFlight`].

use crate::export::Artifact;
use crate::watermark::WatermarkError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Upload endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path used when scan protection is requested.
    #[serde(default = "default_protected_path")]
    pub protected_path: String,

    /// Path used when scan protection is off.
    #[serde(default = "default_unprotected_path")]
    pub unprotected_path: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_protected_path() -> String {
    "/api/sdk/upload".to_string()
}

fn default_unprotected_path() -> String {
    "/api/sdk/upload/unprotected".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            protected_path: default_protected_path(),
            unprotected_path: default_unprotected_path(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl SubmitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "submit.base_url must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }
        for (field, path) in [
            ("protected_path", &self.protected_path),
            ("unprotected_path", &self.unprotected_path),
        ] {
            if !path.starts_with('/') {
                return Err(format!("submit.{} must start with '/', got '{}'", field, path));
            }
        }
        if self.timeout_seconds == 0 {
            return Err("submit.timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Full endpoint URL for the given protection setting.
    pub fn endpoint(&self, protection: bool) -> String {
        let path = if protection {
            &self.protected_path
        } else {
            &self.unprotected_path
        };
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Errors that can occur while submitting.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A submission is already in progress")]
    InFlight,

    #[error("Upload failed")]
    Upload { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid scan result: {0}")]
    InvalidResponse(String),

    #[error("Export failed: {0}")]
    Export(#[from] WatermarkError),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

/// Opaque scan-result payload returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanResult(pub serde_json::Value);

impl ScanResult {
    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Indented JSON for display.
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

/// Where the session's submission stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded(ScanResult),
    Failed(String),
}

/// Posts artifacts to the upload endpoints.
#[derive(Debug)]
pub struct Submitter {
    client: reqwest::Client,
    config: SubmitConfig,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Submitter {
    pub fn new(config: SubmitConfig) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SubmitError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            config,
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &SubmitConfig {
        &self.config
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<InFlightGuard<'_>, SubmitError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SubmitError::InFlight)?;
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Upload an artifact and return the endpoint's scan result.
    pub async fn submit(
        &self,
        artifact: &Artifact,
        protection: bool,
    ) -> Result<ScanResult, SubmitError> {
        let _guard = self.acquire()?;
        let url = self.config.endpoint(protection);

        let part = reqwest::multipart::Part::bytes(artifact.bytes.to_vec())
            .file_name(artifact.filename.clone())
            .mime_str(artifact.content_type)
            .map_err(|e| SubmitError::Network(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("scanProtection", protection.to_string());

        tracing::debug!(
            url = %url,
            filename = %artifact.filename,
            bytes = artifact.bytes.len(),
            protection,
            "Submitting artifact"
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Upload request failed");
                SubmitError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Upload rejected");
            return Err(SubmitError::Upload {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| SubmitError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            url = %url,
            filename = %artifact.filename,
            status = status.as_u16(),
            "Upload succeeded"
        );
        Ok(ScanResult(value))
    }
}
