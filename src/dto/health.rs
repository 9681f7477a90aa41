use serde::Serialize;

use crate::{dto::phase::VisibleRoundPhase, services::connection::LinkState};

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Phase currently on screen.
    pub phase: VisibleRoundPhase,
    /// State of the game server link.
    pub link: LinkState,
}

impl HealthResponse {
    /// Build a response, degraded whenever the game server link is not open.
    pub fn new(phase: VisibleRoundPhase, link: LinkState) -> Self {
        let status = if link == LinkState::Open {
            "ok"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            phase,
            link,
        }
    }
}
