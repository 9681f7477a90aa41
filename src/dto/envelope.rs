use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw `{type, data}` frame exchanged with the game server.
#[derive(Debug, Deserialize)]
pub struct InboundEnvelope {
    /// Message discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific payload, absent for some messages.
    #[serde(default)]
    pub data: Value,
}

/// Commands the display sends to the game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCommand {
    /// Ask for the current round layout.
    GetConfig,
    /// Ask for the number of new votes since the last poll.
    GetVotes,
    /// Ask the server to settle the round and report the outcome.
    GetResult,
    /// Ask the server to advance to the next round.
    NextRound,
    /// Ask the server to start a fresh game session.
    Reset,
}

impl ClientCommand {
    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetConfig => "get_config",
            Self::GetVotes => "get_votes",
            Self::GetResult => "get_result",
            Self::NextRound => "next_round",
            Self::Reset => "reset",
        }
    }

    /// Serialize the command into its JSON envelope.
    pub fn to_json(self) -> serde_json::Result<String> {
        serde_json::to_string(&OutboundEnvelope {
            kind: self.as_str(),
            data: Map::new(),
        })
    }
}

#[derive(Serialize)]
struct OutboundEnvelope {
    #[serde(rename = "type")]
    kind: &'static str,
    data: Map<String, Value>,
}
