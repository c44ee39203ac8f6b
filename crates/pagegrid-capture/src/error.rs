//! Capture engine error types.

use std::time::Duration;

use thiserror::Error;

use crate::request::WaitUntil;

/// Errors terminating a capture. None of these are retried inside the
/// engine; session teardown always runs before one surfaces.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// URL scheme outside the http/https allow-list.
    #[error("unsupported URL scheme '{scheme}' (only http and https are allowed)")]
    UnsupportedScheme { scheme: String },

    /// URL that could not be parsed at all.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Executable override with a relative path.
    #[error("browser executable override must be an absolute path, got '{path}'")]
    OverrideNotAbsolute { path: String },

    /// No Chrome/Chromium/Edge install could be located.
    #[error("no Chrome or Chromium executable found; install one or set PAGEGRID_CHROME")]
    ExecutableNotFound,

    /// The browser process could not be spawned.
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    /// The DevTools endpoint line never appeared on the browser's stderr.
    #[error("browser did not report its DevTools endpoint within {}ms", .timeout.as_millis())]
    StartupTimeout { timeout: Duration },

    /// The `/json` target list contained no page-level target.
    #[error("no page target exposed by the browser's debugging endpoint")]
    NoPageTarget,

    /// HTTP failure while querying the debugging endpoint.
    #[error("endpoint discovery request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket connect to the page endpoint failed.
    #[error("failed to connect to page endpoint {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// WebSocket connect did not complete in time.
    #[error("page endpoint connect timed out after {}ms", .timeout.as_millis())]
    ConnectTimeout { timeout: Duration },

    /// WebSocket transport failure after connect.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The remote returned an explicit error for a command.
    #[error("protocol error for {method}: {message} (code {code})")]
    Protocol {
        method: String,
        code: i64,
        message: String,
    },

    /// A command received no response in time.
    #[error("command {method} timed out after {}ms", .timeout.as_millis())]
    CommandTimeout { method: String, timeout: Duration },

    /// The wait condition did not resolve in time.
    #[error("{} wait did not resolve within {}ms", .strategy.as_str(), .timeout.as_millis())]
    WaitTimeout {
        strategy: WaitUntil,
        timeout: Duration,
    },

    /// `Page.navigate` reported a navigation failure.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The browser process exited while work was still pending.
    #[error("browser process exited unexpectedly ({status})")]
    BrowserExited { status: String },

    /// The page socket closed while commands or waits were outstanding.
    #[error("page socket closed with work still pending")]
    SocketClosed,

    /// Page taller than the absolute stitching ceiling.
    #[error("page height {height}px exceeds the stitching limit of {limit}px")]
    PageTooTall { height: u32, limit: u32 },

    /// A response was missing a field the engine needs.
    #[error("malformed response: {0}")]
    InvalidResponse(String),

    /// The overall capture deadline elapsed.
    #[error("capture deadline of {}ms exceeded", .timeout.as_millis())]
    DeadlineExceeded { timeout: Duration },

    /// JSON encode/decode failure on the wire.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Segment decode or composite encode failure.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

impl From<tokio_tungstenite::tungstenite::Error> for CaptureError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CaptureError::WebSocket(e.to_string())
    }
}
