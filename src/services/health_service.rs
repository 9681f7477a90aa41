use tracing::warn;

use crate::{dto::health::HealthResponse, services::connection::LinkState, state::SharedState};

/// Report the phase on screen and the game server link, logging a lost link.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let snapshot = state.snapshot().await;
    let link = state.link_state();
    if link != LinkState::Open {
        warn!(?link, "game server link not open (degraded mode)");
    }

    HealthResponse::new(snapshot.phase.into(), link)
}
