//! Change notifications for external subscribers.
//!
//! Delivery is fire-and-forget: decisions never depend on an event being
//! received, and publishing with nobody listening is not an error.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

/// Emitted when the set of known users changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalsChanged {
    /// Users present after the change but not before.
    pub added: Vec<String>,
    /// Users present before the change but not after.
    pub removed: Vec<String>,
}

impl PrincipalsChanged {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Broadcast channel for [`PrincipalsChanged`] events.
///
/// Cloning the bus shares the channel, so several stores can publish to the
/// same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PrincipalsChanged>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event; returns how many subscribers will see it.
    pub fn publish(&self, event: PrincipalsChanged) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("PrincipalsChanged published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PrincipalsChanged> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
