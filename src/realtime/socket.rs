use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{InvalidationEvent, ListenerId, RealtimeError, Transport};
use crate::resources::KNOWN_TOPICS;

/// WebSocket transport. Owns the registry of connected listeners; each
/// connection drains its own outbound queue so a slow client never blocks a
/// publisher.
#[derive(Default)]
pub struct SocketHub {
    listeners: RwLock<HashMap<ListenerId, mpsc::UnboundedSender<Message>>>,
}

impl SocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ListenerId, mpsc::UnboundedSender<Message>>> {
        self.listeners.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ListenerId, mpsc::UnboundedSender<Message>>> {
        self.listeners.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register(&self) -> (ListenerId, mpsc::UnboundedReceiver<Message>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.write().insert(id, tx);
        info!("Realtime listener {} connected", id);
        (id, rx)
    }

    fn unregister(&self, id: ListenerId) {
        if self.write().remove(&id).is_some() {
            info!("Realtime listener {} disconnected", id);
        }
    }

    /// Relay a client frame naming a known topic to every other listener.
    /// Accepts `{"topic": "..."}` or a bare topic string.
    pub fn relay(&self, from: ListenerId, frame: &str) -> usize {
        let Some(topic) = parse_topic(frame) else {
            debug!("Ignoring realtime frame from {}: no known topic", from);
            return 0;
        };

        let event = InvalidationEvent { topic };
        self.listeners()
            .into_iter()
            .filter(|listener| *listener != from)
            .filter(|listener| self.send(*listener, &event).is_ok())
            .count()
    }

    async fn serve(self: Arc<Self>, socket: WebSocket) {
        let (id, mut outbound) = self.register();
        let (mut sink, mut stream) = socket.split();

        let hello = json!({ "type": "connected", "id": id }).to_string();
        if sink.send(Message::Text(hello)).await.is_err() {
            self.unregister(id);
            return;
        }

        let writer = tokio::spawn(async move {
            while let Some(message) = outbound.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    self.relay(id, &text);
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }

        self.unregister(id);
        writer.abort();
    }
}

impl Transport for SocketHub {
    fn listeners(&self) -> Vec<ListenerId> {
        self.read().keys().copied().collect()
    }

    fn send(&self, listener: ListenerId, event: &InvalidationEvent) -> Result<(), RealtimeError> {
        let frame = json!({ "topic": event.topic }).to_string();
        self.read()
            .get(&listener)
            .ok_or(RealtimeError::ListenerGone(listener))?
            .send(Message::Text(frame))
            .map_err(|_| RealtimeError::ListenerGone(listener))
    }
}

fn parse_topic(frame: &str) -> Option<String> {
    let topic = match serde_json::from_str::<Value>(frame) {
        Ok(Value::Object(map)) => map.get("topic")?.as_str()?.to_string(),
        Ok(Value::String(s)) => s,
        _ => frame.trim().to_string(),
    };
    KNOWN_TOPICS.contains(&topic.as_str()).then_some(topic)
}

/// GET /realtime - upgrade to a listener connection
pub async fn realtime_handler(ws: WebSocketUpgrade, State(hub): State<Arc<SocketHub>>) -> Response {
    ws.on_upgrade(move |socket| hub.serve(socket))
}
