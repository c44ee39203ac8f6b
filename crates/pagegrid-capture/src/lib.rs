//! Browser capture engine for pagegrid.
//!
//! Launches a headless Chrome/Chromium, speaks the DevTools wire protocol
//! directly over one WebSocket, drives navigation with a selectable
//! load-completion strategy, and captures full-page screenshots. Pages
//! taller than the browser's single-capture ceiling are captured as
//! scrolled segments and stitched into one image.
//!
//! ```text
//! launcher ──► discovery ──► client ──► wait ──► screenshot
//!    │   stderr scan + /json    │  {id,method,params}      │
//!    └──────────── lifecycle controller (deadline, cleanup) ┘
//! ```
//!
//! One capture owns one process and one socket; both are destroyed before
//! [`capture`] returns, on every path. There is no retry inside the
//! engine and no state shared between captures.
//!
//! ```rust,ignore
//! let result = pagegrid_capture::capture(CaptureRequest {
//!     url: "https://example.com".into(),
//!     viewport_width: 1440,
//!     wait_until: WaitUntil::NetworkIdle,
//!     delay_ms: 0,
//!     timeout_ms: 30_000,
//! })
//! .await?;
//! std::fs::write("page.png", &result.image)?;
//! ```

mod capture;
mod client;
mod discovery;
mod error;
mod launcher;
mod protocol;
mod request;
mod screenshot;
mod wait;

pub use capture::capture;
pub use error::CaptureError;
pub use launcher::{BROWSER_PATH_ENV, resolve_executable};
pub use protocol::CdpEvent;
pub use request::{CaptureRequest, CaptureResult, WaitUntil};
