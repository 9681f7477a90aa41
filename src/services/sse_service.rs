use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::{
    dto::sse::ServerEvent,
    state::{SharedState, SseHub},
};

/// Subscribe to the display SSE stream, along with the renders describing the
/// screen currently shown.
pub fn subscribe_display(
    state: &SharedState,
) -> (Vec<ServerEvent>, broadcast::Receiver<ServerEvent>) {
    state.display_sse().subscribe_with_replay()
}

/// Convert a broadcast receiver into an SSE response, replaying `replay`
/// first and then forwarding events until the client disconnects.
pub fn to_sse_stream(
    replay: Vec<ServerEvent>,
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        for payload in replay {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                tracing::info!("Display SSE stream disconnected");
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Renderer falls behind; the next round view resynchronises it.
                            debug!(skipped, "display SSE client lagged");
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!("Display SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Send a human-readable info message onto the display stream.
pub fn broadcast_display_info(hub: &SseHub, message: &str) {
    hub.broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}

#[cfg(test)]
mod tests {
    use tokio::sync::watch;

    use super::*;
    use crate::{
        services::connection::LinkState,
        state::{AppState, state_machine::RoundStateMachine},
    };

    #[test]
    fn info_message_is_named() {
        let (_tx, link) = watch::channel(LinkState::Disconnected);
        let state = AppState::new(RoundStateMachine::new().snapshot(), link);
        let (replay, mut receiver) = subscribe_display(&state);
        assert!(replay.is_empty());

        broadcast_display_info(state.display_sse(), "display stream connected");

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("info"));
        assert_eq!(event.data, "display stream connected");

        // Info messages are not part of the screen a late subscriber needs.
        let (replay, _receiver) = subscribe_display(&state);
        assert!(replay.is_empty());
    }
}
