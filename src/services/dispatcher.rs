//! Fire-and-forget action bus between the autofill service and the store.

use tokio::sync::broadcast;
use tracing::debug;

use crate::types::action::DataStoreAction;

const CHANNEL_CAPACITY: usize = 64;

/// Broadcasts [`DataStoreAction`]s to every subscriber.
#[derive(Clone)]
pub struct Dispatcher {
    sender: broadcast::Sender<DataStoreAction>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Sends `action` to current subscribers. Having none is not an error.
    pub fn dispatch(&self, action: DataStoreAction) {
        let (event_method, event_object) = action.telemetry();
        let delivered = self.sender.send(action).unwrap_or(0);
        debug!(event_method, event_object, delivered, "dispatch");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataStoreAction> {
        self.sender.subscribe()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
