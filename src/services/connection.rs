//! Game server websocket link with a permanent fixed-delay reconnect loop.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    time::sleep,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};
use tracing::{debug, info, warn};

use crate::{dto::envelope::ClientCommand, error::TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of the game server link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No connection; waiting for the next attempt.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The websocket is open.
    Open,
}

/// Notifications pushed by the connection manager to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A session started.
    Connected,
    /// The current session ended.
    Disconnected,
    /// A text frame arrived.
    Message(String),
}

/// Send capability handed to the rest of the application.
#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<ClientCommand>,
    link: watch::Receiver<LinkState>,
}

impl CommandSender {
    /// Queue `command` if the link is open; drop it otherwise.
    ///
    /// Returns whether the command was queued.
    pub fn send(&self, command: ClientCommand) -> bool {
        if *self.link.borrow() != LinkState::Open {
            debug!(command = command.as_str(), "link not open; dropping command");
            return false;
        }
        self.tx.send(command).is_ok()
    }

    /// Current link state.
    pub fn link_state(&self) -> LinkState {
        *self.link.borrow()
    }

    /// Subscribe to link state updates.
    pub fn link_watcher(&self) -> watch::Receiver<LinkState> {
        self.link.clone()
    }
}

/// Owner of the websocket. Run it with [`ConnectionManager::run`].
pub struct ConnectionManager {
    url: String,
    reconnect_delay: Duration,
    link: watch::Sender<LinkState>,
    outbound: mpsc::UnboundedReceiver<ClientCommand>,
    events: mpsc::UnboundedSender<LinkEvent>,
}

/// Create a connection manager, its command sender and the event receiver it feeds.
pub fn channel(
    url: impl Into<String>,
    reconnect_delay: Duration,
) -> (
    ConnectionManager,
    CommandSender,
    mpsc::UnboundedReceiver<LinkEvent>,
) {
    let (link_tx, link_rx) = watch::channel(LinkState::Disconnected);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let manager = ConnectionManager {
        url: url.into(),
        reconnect_delay,
        link: link_tx,
        outbound: outbound_rx,
        events: events_tx,
    };
    let sender = CommandSender {
        tx: outbound_tx,
        link: link_rx,
    };
    (manager, sender, events_rx)
}

impl ConnectionManager {
    /// Connect, pump frames while open and reconnect after `reconnect_delay`, forever.
    ///
    /// Returns once the event receiver has been dropped.
    pub async fn run(mut self) {
        loop {
            match self.connect().await {
                Ok(ws) => {
                    if self.events.send(LinkEvent::Connected).is_err() {
                        return;
                    }
                    let outcome = self.pump(ws).await;
                    self.link.send_replace(LinkState::Disconnected);
                    match outcome {
                        Ok(()) => return,
                        Err(err) => warn!(error = %err, "game server link lost"),
                    }
                    if self.events.send(LinkEvent::Disconnected).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    self.link.send_replace(LinkState::Disconnected);
                    warn!(url = %self.url, error = %err, "game server connection attempt failed");
                }
            }

            if self.events.is_closed() {
                return;
            }
            info!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnecting to game server");
            sleep(self.reconnect_delay).await;
        }
    }

    async fn connect(&mut self) -> Result<WsStream, TransportError> {
        self.link.send_replace(LinkState::Connecting);
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(TransportError::Connect)?;

        // Commands queued for a previous session are stale.
        let mut discarded = 0usize;
        while self.outbound.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "discarded commands queued before reconnection");
        }

        self.link.send_replace(LinkState::Open);
        info!(url = %self.url, "connected to game server");
        Ok(ws)
    }

    /// Forward frames until the session ends.
    ///
    /// `Ok(())` means the application is shutting down; any other end of session is an error.
    async fn pump(&mut self, ws: WsStream) -> Result<(), TransportError> {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if self.events.send(LinkEvent::Message(text.to_string())).is_err() {
                            let _ = sink.close().await;
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(TransportError::Stream(err)),
                },
                outbound = self.outbound.recv() => {
                    let Some(command) = outbound else {
                        let _ = sink.close().await;
                        return Ok(());
                    };
                    let payload = match command.to_json() {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(command = command.as_str(), error = %err, "failed to serialize command");
                            continue;
                        }
                    };
                    sink.send(Message::Text(payload.into()))
                        .await
                        .map_err(TransportError::Stream)?;
                    debug!(command = command.as_str(), "sent command");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use tokio::{net::TcpListener, time::timeout};
    use tokio_tungstenite::accept_async;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        accept_async(stream).await.unwrap()
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<LinkEvent>) -> LinkEvent {
        timeout(WAIT, events.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn commands_are_dropped_until_open() {
        let (listener, url) = listener().await;
        let (manager, sender, mut events) = channel(url, Duration::from_millis(50));

        assert_eq!(sender.link_state(), LinkState::Disconnected);
        assert!(!sender.send(ClientCommand::GetConfig));

        tokio::spawn(manager.run());
        let mut server = accept(&listener).await;
        assert_eq!(next_event(&mut events).await, LinkEvent::Connected);
        assert_eq!(sender.link_state(), LinkState::Open);

        assert!(sender.send(ClientCommand::GetVotes));
        let frame = timeout(WAIT, server.next()).await.unwrap().unwrap().unwrap();
        let value: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"type": "get_votes", "data": {}}));
    }

    #[tokio::test]
    async fn inbound_text_is_forwarded() {
        let (listener, url) = listener().await;
        let (manager, _sender, mut events) = channel(url, Duration::from_millis(50));
        tokio::spawn(manager.run());

        let mut server = accept(&listener).await;
        assert_eq!(next_event(&mut events).await, LinkEvent::Connected);

        let frame = r#"{"type":"votes","data":3}"#;
        server.send(Message::Text(frame.into())).await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            LinkEvent::Message(frame.to_string())
        );
    }

    #[tokio::test]
    async fn reconnects_after_server_drops_link() {
        let (listener, url) = listener().await;
        let (manager, sender, mut events) = channel(url, Duration::from_millis(50));
        tokio::spawn(manager.run());

        let server = accept(&listener).await;
        assert_eq!(next_event(&mut events).await, LinkEvent::Connected);

        drop(server);
        assert_eq!(next_event(&mut events).await, LinkEvent::Disconnected);
        assert!(!sender.send(ClientCommand::GetResult));

        let _server = accept(&listener).await;
        assert_eq!(next_event(&mut events).await, LinkEvent::Connected);
        assert_eq!(sender.link_state(), LinkState::Open);
    }

    #[tokio::test]
    async fn commands_queued_between_sessions_are_discarded() {
        let (listener, url) = listener().await;
        let (manager, sender, mut events) = channel(url, Duration::from_millis(50));

        // Bypass the open-link gate to leave a command behind in the queue.
        assert_eq!(sender.link_state(), LinkState::Disconnected);
        sender.tx.send(ClientCommand::Reset).unwrap();

        tokio::spawn(manager.run());
        let mut server = accept(&listener).await;
        assert_eq!(next_event(&mut events).await, LinkEvent::Connected);

        assert!(sender.send(ClientCommand::GetConfig));
        let frame = timeout(WAIT, server.next()).await.unwrap().unwrap().unwrap();
        let value: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"type": "get_config", "data": {}}));
    }

    #[tokio::test]
    async fn keeps_retrying_while_server_is_unreachable() {
        let (listener, url) = listener().await;
        drop(listener);
        let (manager, sender, _events) = channel(url, Duration::from_millis(20));
        let task = tokio::spawn(manager.run());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!task.is_finished());
        assert_ne!(sender.link_state(), LinkState::Open);
        task.abort();
    }

    #[tokio::test]
    async fn stops_once_event_consumer_is_gone() {
        let (listener, url) = listener().await;
        let (manager, _sender, events) = channel(url, Duration::from_millis(20));
        drop(events);
        drop(listener);

        timeout(WAIT, manager.run()).await.unwrap();
    }
}
