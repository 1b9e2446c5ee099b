//! WebSocket support for live status updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use snapcart_core::{StatusEvent, StatusObserver};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// How long a closing socket may take to flush its close frame on shutdown.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A poller reported progress or an outcome.
    Status { event: StatusEvent },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // No receivers just means no client is connected
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    pub fn heartbeat(&self) {
        self.broadcast(WsMessage::Heartbeat {
            timestamp: chrono::Utc::now().timestamp(),
        });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl StatusObserver for WsBroadcaster {
    fn on_status(&self, event: &StatusEvent) {
        self.broadcast(WsMessage::Status {
            event: event.clone(),
        });
    }
}

/// WebSocket upgrade handler.
///
/// The socket task only holds its broadcast receiver and the shutdown token,
/// never the app state, so open connections cannot keep the coordinator alive.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.ws_broadcaster().subscribe();
    let shutdown = state.shutdown_token().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, rx, shutdown))
}

async fn handle_socket(
    socket: WebSocket,
    mut rx: broadcast::Receiver<WsMessage>,
    shutdown: CancellationToken,
) {
    let (mut sender, mut receiver) = socket.split();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!("WebSocket client connected");

    let send_shutdown = shutdown.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                _ = send_shutdown.cancelled() => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                received = rx.recv() => received,
            };
            match received {
                Ok(msg) => {
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

                    let json = match serde_json::to_string(&msg) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Clients only listen; anything they send besides close is ignored
    loop {
        let result = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Closing WebSocket for shutdown");
                break;
            }
            result = receiver.next() => result,
        };
        match result {
            Some(Ok(Message::Close(_))) | None => {
                debug!("WebSocket client closed the connection");
                break;
            }
            Some(Ok(Message::Text(text))) => {
                debug!("Ignoring client message: {}", text);
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Let the close frame go out before dropping the sink
    let abort = send_task.abort_handle();
    if !shutdown.is_cancelled() || timeout(CLOSE_GRACE, send_task).await.is_err() {
        abort.abort();
    }
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}
