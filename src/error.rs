use std::io;

use thiserror::Error;
use tokio_tungstenite::tungstenite;
use validator::ValidationErrors;

/// Failures of the game server link. Always recovered by reconnecting.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The websocket handshake could not be completed.
    #[error("failed to connect to game server")]
    Connect(#[source] tungstenite::Error),
    /// Reading from or writing to an open websocket failed.
    #[error("websocket stream failed")]
    Stream(#[source] tungstenite::Error),
    /// The server closed the websocket.
    #[error("game server closed the connection")]
    Closed,
}

/// Inbound frames that cannot be turned into a routed message. Always dropped.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not a `{type, data}` JSON envelope.
    #[error("malformed envelope")]
    Malformed(#[source] serde_json::Error),
    /// The payload of a known message type has the wrong shape.
    #[error("invalid `{kind}` payload")]
    InvalidPayload {
        /// Message type whose payload failed to decode.
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    /// The payload decoded but breaks a round invariant.
    #[error("`{kind}` payload rejected: {source}")]
    Rejected {
        /// Message type whose payload was rejected.
        kind: String,
        #[source]
        source: ValidationErrors,
    },
}

/// Reasons the configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config")]
    Read(#[source] io::Error),
    /// The file is not valid configuration JSON.
    #[error("failed to parse config")]
    Parse(#[source] serde_json::Error),
    /// The values are out of range.
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationErrors),
}
