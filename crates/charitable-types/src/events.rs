use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ids::{PostId, SessionId};

/// Checkout stage as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    Idle,
    CreatingSession,
    AwaitingExternalCompletion,
    SettledUnknown,
    Cancelled,
}

/// Notifications the sync layer emits for screens to render hints from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientEvent {
    /// A post's like state converged on the server's answer
    ReactionSettled {
        post_id: PostId,
        liked: bool,
        count: u64,
    },

    /// A toggle failed and the optimistic change was undone
    ReactionRolledBack { post_id: PostId, message: String },

    /// The guest identifier could not be read or created
    IdentityUnavailable { message: String },

    /// The donation checkout moved to a new phase
    CheckoutStateChanged {
        phase: CheckoutPhase,
        session_id: Option<SessionId>,
    },
}

/// Fan-out of [`ClientEvent`]s. Cloning shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Dropped silently when nobody listens.
    pub fn publish(&self, event: ClientEvent) {
        tracing::trace!(?event, "client event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
