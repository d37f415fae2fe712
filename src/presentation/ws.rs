// WebSocket push channel: clients subscribe to topics, the server forwards hub messages
use crate::application::channels::{ChannelHub, PushMessage, Topic};
use crate::infrastructure::chunked_json::receiver_stream;
use crate::presentation::app_state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const OUTBOUND_BUFFER: usize = 64;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Subscribe,
    Unsubscribe,
}

/// `{ "action": "subscribe", "topics": ["sensors:values"] }`
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub action: Action,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Topic forwarders of one connection. Dropping it stops them all.
struct Subscriptions {
    hub: Arc<ChannelHub>,
    out: mpsc::Sender<PushMessage>,
    tasks: HashMap<Topic, JoinHandle<()>>,
}

impl Subscriptions {
    fn new(hub: Arc<ChannelHub>, out: mpsc::Sender<PushMessage>) -> Self {
        Self {
            hub,
            out,
            tasks: HashMap::new(),
        }
    }

    /// Apply a client frame. Returns error frames for topics that could not be handled.
    fn apply(&mut self, frame: &ClientFrame) -> Vec<PushMessage> {
        let mut errors = Vec::new();
        for raw in &frame.topics {
            match Topic::parse(raw) {
                Ok(topic) => match frame.action {
                    Action::Subscribe => self.subscribe(topic),
                    Action::Unsubscribe => self.unsubscribe(topic),
                },
                Err(e) => errors.push(PushMessage::error("unknown_topic", e.to_string())),
            }
        }
        errors
    }

    fn subscribe(&mut self, topic: Topic) {
        if self.tasks.contains_key(&topic) {
            return;
        }
        let rx = self.hub.subscribe(topic);
        let out = self.out.clone();
        let task = tokio::spawn(async move {
            let mut stream = std::pin::pin!(receiver_stream(rx));
            while let Some(msg) = stream.next().await {
                if out.send(msg).await.is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(topic, task);
    }

    fn unsubscribe(&mut self, topic: Topic) {
        if let Some(task) = self.tasks.remove(&topic) {
            task.abort();
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let hub = state.hub.clone();
    let shutdown = state.shutdown.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, shutdown))
}

async fn handle_socket(socket: WebSocket, hub: Arc<ChannelHub>, shutdown: CancellationToken) {
    let conn_id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    tracing::info!(conn_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<PushMessage>(OUTBOUND_BUFFER);

    // Sender task: serialize outbound frames onto the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(conn_id, error = %e, "failed to encode push frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                tracing::debug!(conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let mut subscriptions = Subscriptions::new(hub, out_tx.clone());

    loop {
        let result = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = stream.next() => match next {
                Some(result) => result,
                None => break,
            },
        };

        match result {
            Ok(Message::Text(text)) => {
                let errors = match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => {
                        tracing::debug!(conn_id, action = ?frame.action, topics = ?frame.topics, "client frame");
                        subscriptions.apply(&frame)
                    }
                    Err(e) => vec![PushMessage::error("bad_frame", e.to_string())],
                };
                for error in errors {
                    if out_tx.send(error).await.is_err() {
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    drop(subscriptions);
    send_task.abort();
    tracing::info!(conn_id, "WebSocket disconnected");
}
