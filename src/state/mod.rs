mod sse;
/// Round phase graph.
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::services::connection::LinkState;

pub use self::sse::SseHub;
use self::state_machine::Snapshot;

/// Handle to the shared application state.
pub type SharedState = Arc<AppState>;

/// Capacity of the display SSE channel; slow subscribers skip lagged events.
const DISPLAY_SSE_CAPACITY: usize = 64;

/// State shared between the display loop and the HTTP routes.
///
/// The round controller itself is owned by the display loop; this only holds
/// what the loop publishes for readers.
pub struct AppState {
    display_sse: SseHub,
    snapshot: RwLock<Snapshot>,
    link: watch::Receiver<LinkState>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(initial: Snapshot, link: watch::Receiver<LinkState>) -> SharedState {
        Arc::new(Self {
            display_sse: SseHub::new(DISPLAY_SSE_CAPACITY),
            snapshot: RwLock::new(initial),
            link,
        })
    }

    /// Broadcast hub carrying render events to the browser renderer.
    pub fn display_sse(&self) -> &SseHub {
        &self.display_sse
    }

    /// Last phase snapshot published by the display loop.
    pub async fn snapshot(&self) -> Snapshot {
        *self.snapshot.read().await
    }

    /// Publish the phase snapshot after the display loop handled an event.
    pub async fn publish_snapshot(&self, snapshot: Snapshot) {
        let mut guard = self.snapshot.write().await;
        *guard = snapshot;
    }

    /// Current state of the game server link.
    pub fn link_state(&self) -> LinkState {
        *self.link.borrow()
    }
}
