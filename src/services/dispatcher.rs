//! Decoding and routing of inbound game server frames.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use validator::Validate;

use crate::{
    dto::{
        envelope::InboundEnvelope,
        round::{RoundConfig, RoundResult},
    },
    error::ProtocolError,
};

const MSG_CONFIG: &str = "config";
const MSG_NEXT_ROUND: &str = "next_round";
const MSG_VOTES: &str = "votes";
const MSG_RESULT: &str = "result";

/// Server message after routing. `config` and `next_round` share a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Replacement round layout.
    Config(RoundConfig),
    /// Number of new votes since the previous poll.
    Votes(u32),
    /// Outcome of the current round.
    Result(RoundResult),
}

/// Decode a text frame and route it by message type.
///
/// Unknown message types resolve to `Ok(None)`.
pub fn decode(text: &str) -> Result<Option<Inbound>, ProtocolError> {
    let envelope: InboundEnvelope = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
    route(envelope)
}

fn route(envelope: InboundEnvelope) -> Result<Option<Inbound>, ProtocolError> {
    let InboundEnvelope { kind, data } = envelope;
    let inbound = match kind.as_str() {
        MSG_CONFIG | MSG_NEXT_ROUND => Inbound::Config(payload(&kind, data)?),
        MSG_VOTES => Inbound::Votes(payload(&kind, data)?),
        MSG_RESULT => Inbound::Result(payload(&kind, data)?),
        other => {
            debug!(kind = %other, "ignoring unknown message type");
            return Ok(None);
        }
    };

    validate(&kind, &inbound)?;
    Ok(Some(inbound))
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}

fn validate(kind: &str, inbound: &Inbound) -> Result<(), ProtocolError> {
    let outcome = match inbound {
        Inbound::Config(config) => config.validate(),
        Inbound::Result(result) => result.validate(),
        Inbound::Votes(_) => Ok(()),
    };
    outcome.map_err(|source| ProtocolError::Rejected {
        kind: kind.to_string(),
        source,
    })
}
