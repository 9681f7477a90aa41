use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

/// Stream render events to the browser renderer.
pub async fn display_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (replay, receiver) = sse_service::subscribe_display(&state);
    info!(replayed = replay.len(), "New display SSE connection");
    sse_service::broadcast_display_info(state.display_sse(), "display stream connected");
    sse_service::to_sse_stream(replay, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/display", get(display_stream))
}
