//! Snapshot forwarding to connected viewers.
//!
//! A [`ViewerRelay`] turns store notifications into [`ServerMessage`]s on a
//! `tokio::sync::broadcast` channel. Transports (WebSocket, SSE, ...) hold a
//! [`ViewerSession`] per client and drain its receiver.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WhiteboardConfig;
use crate::element::WhiteboardData;
use crate::error::WhiteboardError;
use crate::notifier::Subscription;
use crate::store::WhiteboardStore;

/// Messages sent from the server to a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    WhiteboardData {
        data: WhiteboardData,
    },
    Error {
        message: String,
    },
    Connected {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, WhiteboardError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages sent from a viewer to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Replace the whole document. Kept untyped so a malformed payload is
    /// reported as a structural error rather than a parse failure.
    WhiteboardUpdate { data: Value },
    Subscribe,
    Unsubscribe,
}

impl ClientMessage {
    pub fn parse(raw: &str) -> Result<Self, WhiteboardError> {
        serde_json::from_str(raw)
            .map_err(|e| WhiteboardError::Structural(format!("invalid client message: {e}")))
    }
}

/// Applies a viewer message to `store` and returns the direct reply, if any.
///
/// Successful updates get no reply: every viewer, the sender included,
/// receives the new document through the relay broadcast.
pub fn handle_client_message(
    store: &mut WhiteboardStore,
    message: ClientMessage,
) -> Option<ServerMessage> {
    match message {
        ClientMessage::WhiteboardUpdate { data } => match store.set_data_json(data) {
            Ok(()) => None,
            Err(e) => {
                warn!("Rejected whiteboard update from viewer: {e}");
                Some(ServerMessage::Error {
                    message: e.user_message(),
                })
            }
        },
        ClientMessage::Subscribe => Some(ServerMessage::WhiteboardData {
            data: store.get_data(),
        }),
        ClientMessage::Unsubscribe => None,
    }
}

// ---------------------------------------------------------------------------
// ViewerRelay
// ---------------------------------------------------------------------------

/// One connected viewer.
#[derive(Debug)]
pub struct ViewerSession {
    pub session_id: String,
    pub receiver: broadcast::Receiver<ServerMessage>,
}

impl ViewerSession {
    /// The greeting a transport sends right after the handshake.
    pub fn connected_message(&self) -> ServerMessage {
        ServerMessage::Connected {
            session_id: self.session_id.clone(),
        }
    }
}

/// Forwards every committed snapshot of a store to all connected viewers.
///
/// The store subscription is released when the relay is dropped.
#[derive(Debug)]
pub struct ViewerRelay {
    sender: broadcast::Sender<ServerMessage>,
    subscription: Subscription,
}

impl ViewerRelay {
    /// Subscribes to `store`. `capacity` bounds how many messages a slow
    /// viewer may lag behind before it starts missing snapshots.
    pub fn attach(store: &WhiteboardStore, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let tx = sender.clone();
        let subscription = store.subscribe(move |snapshot| {
            let message = ServerMessage::WhiteboardData {
                data: snapshot.clone(),
            };
            // No viewers connected is not a failure.
            if let Ok(n) = tx.send(message) {
                debug!("Relayed snapshot to {n} viewers");
            }
            Ok(())
        });
        info!("Viewer relay attached (capacity {capacity})");
        Self {
            sender,
            subscription,
        }
    }

    /// Attaches with the channel capacity from `config`.
    pub fn attach_with_config(store: &WhiteboardStore, config: &WhiteboardConfig) -> Self {
        Self::attach(store, config.relay_capacity)
    }

    pub fn connect_viewer(&self) -> ViewerSession {
        let session_id = Uuid::new_v4().to_string();
        info!("Viewer connected: {session_id}");
        ViewerSession {
            session_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn viewer_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends an out-of-band message to every viewer. Returns how many
    /// received it.
    pub fn broadcast(&self, message: ServerMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }
}

impl Drop for ViewerRelay {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        debug!("Viewer relay detached");
    }
}
