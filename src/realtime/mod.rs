// Fire-and-forget "resource changed" notifications.
//
// The bus owns no listener registry: at publish time it asks the bound
// transport which listeners are connected and sends to each of them except the
// one that caused the change. Delivery is best effort and never fails a caller.

pub mod socket;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub use socket::{realtime_handler, SocketHub};

pub type ListenerId = Uuid;

/// Zero-payload notification naming the resource topic that changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationEvent {
    pub topic: String,
}

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Realtime transport already bound")]
    AlreadyBound,
    #[error("Listener {0} is gone")]
    ListenerGone(ListenerId),
}

/// Live channel to the connected listeners
pub trait Transport: Send + Sync {
    /// Listeners connected right now
    fn listeners(&self) -> Vec<ListenerId>;

    fn send(&self, listener: ListenerId, event: &InvalidationEvent) -> Result<(), RealtimeError>;
}

#[derive(Default)]
pub struct InvalidationBus {
    transport: OnceCell<Arc<dyn Transport>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the transport. Only the first call succeeds.
    pub fn bind(&self, transport: Arc<dyn Transport>) -> Result<(), RealtimeError> {
        self.transport.set(transport).map_err(|_| RealtimeError::AlreadyBound)
    }

    pub fn is_bound(&self) -> bool {
        self.transport.get().is_some()
    }

    /// Notify every connected listener except `exclude`. Returns how many
    /// listeners were sent the event.
    pub fn publish(&self, topic: &str, exclude: Option<ListenerId>) -> usize {
        let Some(transport) = self.transport.get() else {
            warn!("Realtime transport not bound, dropping '{}' notification", topic);
            return 0;
        };

        let event = InvalidationEvent { topic: topic.to_string() };
        let mut delivered = 0;
        for listener in transport.listeners() {
            if Some(listener) == exclude {
                continue;
            }
            match transport.send(listener, &event) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Skipping listener during '{}' publish: {}", topic, e),
            }
        }

        debug!("Published '{}' to {} listener(s)", topic, delivered);
        delivered
    }
}
