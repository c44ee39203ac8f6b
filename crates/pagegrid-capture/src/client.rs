//! Page-level CDP WebSocket client.
//!
//! One persistent socket per capture. Outbound commands get ids from a
//! per-session counter and park a oneshot in the pending map; the read
//! loop routes inbound messages by id (command replies) or method name
//! (events). Replies may arrive out of send order; correlation is purely
//! by id. Events fan out on a broadcast channel to whichever wait
//! strategy currently holds a receiver.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::error::CaptureError;
use crate::protocol::{CdpMessage, CdpRequest};

pub use crate::protocol::CdpEvent;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Default per-command timeout; the overall capture deadline supersedes it.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Event channel depth. A stitched capture of a busy page emits bursts of
/// network events; lagging receivers log and continue.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One outstanding command: the awaiting caller plus the method name for
/// error context.
struct PendingCommand {
    method: String,
    tx: oneshot::Sender<Result<Value, CaptureError>>,
}

type Pending = Arc<Mutex<HashMap<u64, PendingCommand>>>;

/// Command dispatcher for one page-level socket.
pub(crate) struct CdpClient {
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    next_id: AtomicU64,
    pending: Pending,
    events: broadcast::Sender<CdpEvent>,
    _read_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the page endpoint, bounded by `timeout`.
    pub(crate) async fn connect(ws_url: &str, timeout: Duration) -> Result<Self, CaptureError> {
        let connect = tokio_tungstenite::connect_async(ws_url);
        let (ws_stream, _) = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| CaptureError::ConnectTimeout { timeout })?
            .map_err(|e| CaptureError::ConnectionFailed {
                url: ws_url.to_string(),
                reason: e.to_string(),
            })?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let read_task = {
            let pending = pending.clone();
            let events = events.clone();
            tokio::spawn(async move {
                Self::read_loop(ws_source, pending, events).await;
            })
        };

        debug!(url = ws_url, "connected to page endpoint");

        Ok(Self {
            ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
            next_id: AtomicU64::new(1),
            pending,
            events,
            _read_task: read_task,
        })
    }

    /// Subscribe to the event stream. Receivers only see events emitted
    /// after subscription, so subscribe before issuing the command whose
    /// events matter.
    pub(crate) fn events(&self) -> broadcast::Receiver<CdpEvent> {
        self.events.subscribe()
    }

    /// Send a command and wait for its reply with the default timeout.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, CaptureError> {
        self.call_with_timeout(method, params, COMMAND_TIMEOUT).await
    }

    /// Send a command and wait for its reply.
    ///
    /// The pending entry for the id is removed exactly once: by the read
    /// loop when the reply arrives, or here when the timeout fires.
    pub(crate) async fn call_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, CaptureError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
        };
        let json = serde_json::to_string(&request)?;
        trace!(id, method, "CDP send");

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(
            id,
            PendingCommand {
                method: method.to_string(),
                tx,
            },
        );

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CaptureError::SocketClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CaptureError::CommandTimeout {
                    method: method.to_string(),
                    timeout,
                })
            }
        }
    }

    /// Send a close frame. Idempotent enough for teardown; transport
    /// errors here are irrelevant because the session is ending anyway.
    pub(crate) async fn close(&self) {
        let mut ws = self.ws_tx.lock().await;
        if let Err(e) = ws.send(Message::Close(None)).await {
            trace!(error = %e, "close frame not sent");
        }
    }

    async fn read_loop(
        mut ws_source: WsSource,
        pending: Pending,
        events: broadcast::Sender<CdpEvent>,
    ) {
        while let Some(msg) = ws_source.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text.to_string(),
                Ok(Message::Close(_)) => {
                    debug!("page socket closed by remote");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "page socket read error");
                    break;
                }
            };

            let message: CdpMessage = match serde_json::from_str(&text) {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = %e, "unparseable CDP message");
                    continue;
                }
            };

            if let Some(id) = message.id {
                let waiter = pending.lock().remove(&id);
                let Some(command) = waiter else {
                    trace!(id, "reply for unknown or timed-out command");
                    continue;
                };
                let outcome = match message.error {
                    Some(err) => Err(CaptureError::Protocol {
                        method: command.method,
                        code: err.code,
                        message: err.message,
                    }),
                    None => Ok(message.result.unwrap_or(Value::Null)),
                };
                let _ = command.tx.send(outcome);
            } else if let Some(event) = message.into_event() {
                // Nobody listening is fine; the event is simply dropped.
                let _ = events.send(event);
            }
        }

        // Socket gone: reject every outstanding command so callers fail
        // instead of waiting out their own timeouts.
        let drained: Vec<_> = pending.lock().drain().collect();
        for (id, command) in drained {
            trace!(id, method = %command.method, "rejecting pending command after socket close");
            let _ = command.tx.send(Err(CaptureError::SocketClosed));
        }
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._read_task.abort();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
