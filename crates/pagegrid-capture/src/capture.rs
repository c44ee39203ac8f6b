//! Capture lifecycle controller.
//!
//! Sequences launch → discovery → dispatch → wait → screenshot under one
//! overall deadline, and guarantees socket and process teardown on every
//! exit path. A single cancellation token is threaded through every
//! suspension point so the deadline supersedes any per-step timeout, and
//! each post-spawn step also races the browser process itself, so an
//! unexpected exit rejects pending work instead of letting it hang.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::CdpClient;
use crate::discovery;
use crate::error::CaptureError;
use crate::launcher::{self, BROWSER_PATH_ENV, BrowserProcess};
use crate::request::{CaptureRequest, CaptureResult};
use crate::screenshot;
use crate::wait;

/// How long the DevTools endpoint line may take to appear on stderr.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Page-socket connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Viewport height; the request only constrains width.
const VIEWPORT_HEIGHT: u32 = 900;

/// Run one capture end to end.
///
/// Exactly one browser process and one socket live for the duration of
/// the call and both are gone before it returns, success or failure.
pub async fn capture(request: CaptureRequest) -> Result<CaptureResult, CaptureError> {
    request.validate()?;
    let override_path = std::env::var_os(BROWSER_PATH_ENV).map(PathBuf::from);
    let executable = launcher::resolve_executable(override_path.as_deref())?;

    let overall = Duration::from_millis(request.timeout_ms);
    let started = Instant::now();
    let cancel = CancellationToken::new();
    let deadline = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(overall).await;
            cancel.cancel();
        })
    };

    let outcome = run(&request, &executable, &cancel, overall, started).await;
    deadline.abort();

    if let Ok(result) = &outcome {
        info!(
            url = %result.url,
            width = result.page_width,
            height = result.page_height,
            segments = ?result.segments_stitched,
            "capture complete"
        );
    }
    outcome
}

async fn run(
    request: &CaptureRequest,
    executable: &Path,
    cancel: &CancellationToken,
    overall: Duration,
    started: Instant,
) -> Result<CaptureResult, CaptureError> {
    let mut process =
        BrowserProcess::launch(executable, request.viewport_width, VIEWPORT_HEIGHT)?;
    let outcome = drive(request, &mut process, cancel, overall, started).await;
    process.shutdown().await;
    outcome
}

async fn drive(
    request: &CaptureRequest,
    process: &mut BrowserProcess,
    cancel: &CancellationToken,
    overall: Duration,
    started: Instant,
) -> Result<CaptureResult, CaptureError> {
    let flight = Flight {
        cancel,
        overall,
        started,
    };

    let stderr = process.take_stderr().ok_or_else(|| {
        CaptureError::LaunchFailed("browser stderr was not piped".to_string())
    })?;
    let browser_ws = flight
        .guard(process, discovery::wait_for_endpoint(stderr, STARTUP_TIMEOUT))
        .await?;
    let page_ws = flight
        .guard(process, discovery::find_page_target(&browser_ws))
        .await?;
    let client = flight
        .guard(process, CdpClient::connect(&page_ws, CONNECT_TIMEOUT))
        .await?;

    let outcome = session(request, process, &client, &flight).await;
    client.close().await;
    outcome
}

async fn session(
    request: &CaptureRequest,
    process: &mut BrowserProcess,
    client: &CdpClient,
    flight: &Flight<'_>,
) -> Result<CaptureResult, CaptureError> {
    flight
        .guard(process, async {
            client.call("Page.enable", None).await?;
            client.call("Network.enable", None).await?;
            client.call("Runtime.enable", None).await?;
            client
                .call(
                    "Page.setLifecycleEventsEnabled",
                    Some(json!({"enabled": true})),
                )
                .await?;
            client
                .call(
                    "Emulation.setDeviceMetricsOverride",
                    Some(json!({
                        "width": request.viewport_width,
                        "height": VIEWPORT_HEIGHT,
                        "deviceScaleFactor": 1,
                        "mobile": false,
                    })),
                )
                .await?;
            Ok(())
        })
        .await?;

    // Subscribe before navigating so a fast page cannot fire its ready
    // event into nothing.
    let events = client.events();

    flight
        .guard(process, async {
            let reply = client
                .call("Page.navigate", Some(json!({"url": request.url})))
                .await?;
            if let Some(text) = reply.get("errorText").and_then(Value::as_str) {
                if !text.is_empty() {
                    return Err(CaptureError::Navigation(text.to_string()));
                }
            }
            Ok(())
        })
        .await?;

    // The wait gets the budget still left on the deadline, not the full
    // duration, so a stalled wait reports which strategy stalled instead
    // of falling through to the deadline token.
    flight
        .guard(
            process,
            wait::wait_for_ready(request.wait_until, events, flight.remaining()),
        )
        .await?;

    if request.delay_ms > 0 {
        debug!(delay_ms = request.delay_ms, "post-load delay");
        flight
            .guard(process, async {
                tokio::time::sleep(Duration::from_millis(request.delay_ms)).await;
                Ok(())
            })
            .await?;
    }

    let page = flight
        .guard(
            process,
            screenshot::capture_page(client, request.viewport_width),
        )
        .await?;

    Ok(CaptureResult {
        image: page.image,
        page_width: page.width,
        page_height: page.height,
        url: request.url.clone(),
        segments_stitched: page.segments_stitched,
    })
}

/// Races every post-spawn step against the overall deadline and the
/// browser process itself.
struct Flight<'a> {
    cancel: &'a CancellationToken,
    overall: Duration,
    started: Instant,
}

impl Flight<'_> {
    /// Budget left on the overall deadline.
    fn remaining(&self) -> Duration {
        self.overall.saturating_sub(self.started.elapsed())
    }

    async fn guard<T>(
        &self,
        process: &mut BrowserProcess,
        step: impl Future<Output = Result<T, CaptureError>>,
    ) -> Result<T, CaptureError> {
        // Biased so a step whose own timeout lands on the same tick as
        // the deadline still reports its more specific error.
        tokio::select! {
            biased;
            outcome = step => outcome,
            status = process.wait() => Err(CaptureError::BrowserExited {
                status: match status {
                    Ok(status) => status.to_string(),
                    Err(e) => e.to_string(),
                },
            }),
            _ = self.cancel.cancelled() => Err(CaptureError::DeadlineExceeded {
                timeout: self.overall,
            }),
        }
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
