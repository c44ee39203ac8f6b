//! Capture request and result types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CaptureError;

/// URL schemes a capture may navigate to.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Load-completion strategy for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// Resolve on `Page.loadEventFired`.
    Load,
    /// Resolve on the `DOMContentLoaded` lifecycle event.
    DomContentLoaded,
    /// Resolve once the network has been quiet for the debounce window.
    NetworkIdle,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
        }
    }
}

impl Default for WaitUntil {
    fn default() -> Self {
        WaitUntil::Load
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitUntil {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(WaitUntil::Load),
            "domcontentloaded" => Ok(WaitUntil::DomContentLoaded),
            "networkidle" => Ok(WaitUntil::NetworkIdle),
            other => Err(format!(
                "unknown wait strategy '{other}' (expected load, domcontentloaded or networkidle)"
            )),
        }
    }
}

/// Immutable input for one capture.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureRequest {
    /// Page URL; must be http or https.
    pub url: String,
    /// Viewport width in CSS pixels.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    /// When navigation counts as complete.
    #[serde(default)]
    pub wait_until: WaitUntil,
    /// Extra delay after the wait condition resolves, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
    /// Overall capture deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_viewport_width() -> u32 {
    1440
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl CaptureRequest {
    /// Pre-flight validation; runs before any process is spawned.
    pub fn validate(&self) -> Result<(), CaptureError> {
        let parsed = Url::parse(&self.url).map_err(|e| CaptureError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
            return Err(CaptureError::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
            });
        }
        Ok(())
    }
}

/// Final output of one capture.
pub struct CaptureResult {
    /// Full-page image, PNG-encoded.
    pub image: Vec<u8>,
    /// Width of the captured image in pixels.
    pub page_width: u32,
    /// Height of the captured image in pixels.
    pub page_height: u32,
    /// The URL that was captured.
    pub url: String,
    /// Number of stitched segments; `None` means a single-shot capture.
    pub segments_stitched: Option<u32>,
}

impl fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureResult")
            .field("image_bytes", &self.image.len())
            .field("page_width", &self.page_width)
            .field("page_height", &self.page_height)
            .field("url", &self.url)
            .field("segments_stitched", &self.segments_stitched)
            .finish()
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
