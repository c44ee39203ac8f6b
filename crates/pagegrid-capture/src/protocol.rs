//! CDP wire message types.
//!
//! Three message shapes travel over the page socket: outbound commands
//! `{id, method, params}`, inbound replies `{id, result}` or
//! `{id, error: {code, message}}`, and inbound events `{method, params}`
//! with no id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound command.
#[derive(Debug, Serialize)]
pub(crate) struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Inbound message, reply or event.
#[derive(Debug, Deserialize)]
pub(crate) struct CdpMessage {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
}

/// Error object embedded in a reply.
#[derive(Debug, Deserialize)]
pub(crate) struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
}

/// Unsolicited event routed to the active wait strategy.
#[derive(Debug, Clone)]
pub struct CdpEvent {
    /// Event method name (e.g. "Page.loadEventFired").
    pub method: String,
    /// Event parameters; `Null` when the event carries none.
    pub params: Value,
}

/// One entry of the `/json` target list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TargetEntry {
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

/// Clip rectangle for `Page.captureScreenshot`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl CdpMessage {
    /// Interpret this message as an event, if it is one.
    ///
    /// Events carry a `method` and no `id`; anything with an `id` is a
    /// command reply even when a `method` is also present.
    pub(crate) fn into_event(self) -> Option<CdpEvent> {
        if self.id.is_some() {
            return None;
        }
        Some(CdpEvent {
            method: self.method?,
            params: self.params.unwrap_or(Value::Null),
        })
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
