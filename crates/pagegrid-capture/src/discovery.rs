//! DevTools endpoint discovery.
//!
//! A freshly launched browser prints `DevTools listening on ws://…` to its
//! stderr once its debugger is up. That endpoint is browser-scoped and
//! cannot host page or network commands, so discovery continues with one
//! HTTP GET against `/json` to find the dedicated socket of the page
//! target.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStderr;
use tracing::{debug, trace};
use url::Url;

use crate::error::CaptureError;
use crate::protocol::TargetEntry;

static ENDPOINT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"DevTools listening on (ws://\S+)").expect("static pattern compiles")
});

/// Scan the browser's stderr for the DevTools endpoint line.
///
/// Bounded by `timeout`; failure here means the browser did not start
/// correctly.
pub(crate) async fn wait_for_endpoint(
    stderr: ChildStderr,
    timeout: Duration,
) -> Result<String, CaptureError> {
    let scan = async {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            trace!(%line, "browser stderr");
            if let Some(captures) = ENDPOINT_LINE.captures(&line) {
                return Some(captures[1].to_string());
            }
        }
        None
    };

    match tokio::time::timeout(timeout, scan).await {
        Ok(Some(endpoint)) => {
            debug!(%endpoint, "discovered DevTools endpoint");
            Ok(endpoint)
        }
        Ok(None) => Err(CaptureError::LaunchFailed(
            "browser closed its stderr before reporting a DevTools endpoint".to_string(),
        )),
        Err(_) => Err(CaptureError::StartupTimeout { timeout }),
    }
}

/// Query `/json` on the discovered endpoint and return the WebSocket URL
/// of the page target.
pub(crate) async fn find_page_target(browser_ws_url: &str) -> Result<String, CaptureError> {
    let list_url = json_list_url(browser_ws_url)?;
    debug!(%list_url, "querying target list");

    let targets: Vec<TargetEntry> = reqwest::get(&list_url).await?.json().await?;
    targets
        .into_iter()
        .find(|t| t.target_type == "page")
        .and_then(|t| {
            debug!(url = %t.url, "selected page target");
            t.web_socket_debugger_url
        })
        .ok_or(CaptureError::NoPageTarget)
}

/// Derive `http://<host>:<port>/json` from the browser-scoped socket URL.
pub(crate) fn json_list_url(browser_ws_url: &str) -> Result<String, CaptureError> {
    let parsed = Url::parse(browser_ws_url).map_err(|e| CaptureError::InvalidUrl {
        url: browser_ws_url.to_string(),
        reason: e.to_string(),
    })?;
    let host = parsed.host_str().ok_or_else(|| CaptureError::InvalidUrl {
        url: browser_ws_url.to_string(),
        reason: "missing host".to_string(),
    })?;
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| CaptureError::InvalidUrl {
            url: browser_ws_url.to_string(),
            reason: "missing port".to_string(),
        })?;
    Ok(format!("http://{host}:{port}/json"))
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
