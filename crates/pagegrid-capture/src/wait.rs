//! Load-completion wait strategies.
//!
//! Each strategy listens to the session's event stream until its
//! condition holds or its timeout fires. The subscription is a broadcast
//! receiver dropped on every exit path, so no listener leaks across
//! subsequent waits.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::CdpEvent;
use crate::error::CaptureError;
use crate::request::WaitUntil;

/// Quiet window the network must hold for `networkidle` to resolve.
const NETWORK_IDLE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Block until the page counts as ready under `strategy`, or `timeout`.
///
/// The receiver must have been subscribed before navigation was issued,
/// otherwise a fast page can fire its ready event into nothing.
pub(crate) async fn wait_for_ready(
    strategy: WaitUntil,
    mut events: broadcast::Receiver<CdpEvent>,
    timeout: Duration,
) -> Result<(), CaptureError> {
    let condition = async {
        match strategy {
            WaitUntil::Load => {
                wait_for_event(&mut events, |e| e.method == "Page.loadEventFired").await
            }
            WaitUntil::DomContentLoaded => {
                wait_for_event(&mut events, |e| {
                    e.method == "Page.lifecycleEvent"
                        && e.params.get("name").and_then(Value::as_str)
                            == Some("DOMContentLoaded")
                })
                .await
            }
            WaitUntil::NetworkIdle => wait_for_network_idle(&mut events).await,
        }
    };

    match tokio::time::timeout(timeout, condition).await {
        Ok(outcome) => {
            if outcome.is_ok() {
                debug!(strategy = strategy.as_str(), "wait condition resolved");
            }
            outcome
        }
        Err(_) => Err(CaptureError::WaitTimeout { strategy, timeout }),
    }
}

async fn wait_for_event(
    events: &mut broadcast::Receiver<CdpEvent>,
    matches: impl Fn(&CdpEvent) -> bool,
) -> Result<(), CaptureError> {
    loop {
        match events.recv().await {
            Ok(event) if matches(&event) => return Ok(()),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return Err(CaptureError::SocketClosed),
        }
    }
}

/// Track in-flight requests and resolve after the debounce window passes
/// with the count at zero.
///
/// The debounce is armed eagerly at entry so a fully static page that
/// never emits a single network event still resolves. A page that never
/// settles (continuous polling) only resolves via the overall deadline.
async fn wait_for_network_idle(
    events: &mut broadcast::Receiver<CdpEvent>,
) -> Result<(), CaptureError> {
    let mut inflight: u32 = 0;
    let idle = tokio::time::sleep(NETWORK_IDLE_DEBOUNCE);
    tokio::pin!(idle);
    let mut armed = true;

    loop {
        tokio::select! {
            _ = &mut idle, if armed => return Ok(()),
            event = events.recv() => match event {
                Ok(event) => match event.method.as_str() {
                    "Network.requestWillBeSent" => {
                        inflight += 1;
                        armed = false;
                    }
                    "Network.loadingFinished" | "Network.loadingFailed" => {
                        inflight = inflight.saturating_sub(1);
                        if inflight == 0 {
                            idle.as_mut().reset(Instant::now() + NETWORK_IDLE_DEBOUNCE);
                            armed = true;
                        }
                    }
                    _ => {}
                },
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(CaptureError::SocketClosed);
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
