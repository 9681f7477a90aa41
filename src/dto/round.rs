use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Identifier of an audience member as reported by the game server.
pub type PlayerId = String;

/// Single cup of the current round.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Cup {
    /// 1-based label printed on the cup, when the server provides one.
    #[serde(default)]
    pub number: Option<u32>,
    /// Whether this cup hides the target ball.
    #[serde(rename = "red", default)]
    pub has_target: bool,
}

/// Round layout and player classification pushed by the server on `config` and `next_round`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_disjoint_players"))]
pub struct RoundConfig {
    /// Current round, starting at 1.
    #[serde(rename = "round")]
    pub round_number: u32,
    /// Number of rounds in a full game.
    pub total_rounds: u32,
    /// Cups in display order.
    #[serde(default)]
    pub cups: Vec<Cup>,
    /// Players still in the game after the last reveal.
    #[serde(default)]
    pub qualified_players: Vec<PlayerId>,
    /// Players eliminated by the last reveal.
    #[serde(default)]
    pub disqualified_players: Vec<PlayerId>,
}

impl RoundConfig {
    /// Number of players the server classified in this round.
    pub fn participant_count(&self) -> u64 {
        (self.qualified_players.len() + self.disqualified_players.len()) as u64
    }
}

/// Outcome of a round, sent in reply to `get_result`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    /// Revealed round layout and classification.
    #[serde(flatten)]
    #[validate(nested)]
    pub config: RoundConfig,
    /// The session ended early, typically because nobody qualified.
    #[serde(default)]
    pub game_over: bool,
    /// The last round completed with qualified winners remaining.
    #[serde(default)]
    pub game_finished: bool,
}

/// Return `players` sorted ascending by identifier with duplicates removed.
pub fn sorted_players<'a, I>(players: I) -> Vec<PlayerId>
where
    I: IntoIterator<Item = &'a PlayerId>,
{
    let mut sorted: Vec<PlayerId> = players.into_iter().cloned().collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

fn validate_disjoint_players(config: &RoundConfig) -> Result<(), ValidationError> {
    let qualified: HashSet<&str> = config
        .qualified_players
        .iter()
        .map(String::as_str)
        .collect();

    if let Some(player) = config
        .disqualified_players
        .iter()
        .find(|player| qualified.contains(player.as_str()))
    {
        let mut err = ValidationError::new("players_overlap");
        err.message = Some(
            format!("player `{player}` is listed as both qualified and disqualified").into(),
        );
        return Err(err);
    }

    Ok(())
}
