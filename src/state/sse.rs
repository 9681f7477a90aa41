use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Simple broadcast hub wrapper used by the SSE services.
///
/// Events sent with [`SseHub::broadcast_retained`] are also kept, one per
/// event name, and replayed to late subscribers.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
    retained: Mutex<Vec<ServerEvent>>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            sender,
            retained: Mutex::new(Vec::new()),
        }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Register a subscriber along with the retained events it has missed.
    ///
    /// Nothing sent after the snapshot is taken is missing from the receiver.
    pub fn subscribe_with_replay(&self) -> (Vec<ServerEvent>, broadcast::Receiver<ServerEvent>) {
        let retained = self.retained();
        (retained.clone(), self.sender.subscribe())
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Send an event and keep it for late subscribers, replacing the retained
    /// event of the same name. `reset` forgets everything retained before.
    pub fn broadcast_retained(&self, event: ServerEvent, reset: bool) {
        let mut retained = self.retained();
        if reset {
            retained.clear();
        } else {
            retained.retain(|kept| kept.event != event.event);
        }
        retained.push(event.clone());
        let _ = self.sender.send(event);
    }

    fn retained(&self) -> MutexGuard<'_, Vec<ServerEvent>> {
        self.retained.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
