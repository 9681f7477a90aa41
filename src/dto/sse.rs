use serde::Serialize;

use crate::dto::{
    phase::VisibleRoundPhase,
    round::{PlayerId, RoundConfig},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialized event data.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already serialized payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
/// Cup as shown to the renderer.
pub struct CupView {
    /// Label printed on the cup.
    pub number: u32,
    /// Whether the ball is under this cup; only present once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_ball: Option<bool>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
/// Broadcast whenever the cups have to be redrawn.
pub struct RoundViewEvent {
    /// Current round.
    pub round: u32,
    /// Rounds in the game.
    pub total_rounds: u32,
    /// Whether the cup contents are visible.
    pub reveal: bool,
    /// Cups in display order.
    pub cups: Vec<CupView>,
}

impl RoundViewEvent {
    /// Build the view of `config`, hiding targets unless `reveal` is set.
    pub fn new(config: &RoundConfig, reveal: bool) -> Self {
        let cups = config
            .cups
            .iter()
            .zip(1u32..)
            .map(|(cup, position)| CupView {
                number: cup.number.unwrap_or(position),
                has_ball: reveal.then_some(cup.has_target),
            })
            .collect();

        Self {
            round: config.round_number,
            total_rounds: config.total_rounds,
            reveal,
            cups,
        }
    }
}

#[derive(Debug, Serialize)]
/// Broadcast when the active player counter changes.
pub struct ActiveCountEvent {
    pub count: u64,
}

#[derive(Debug, Serialize)]
/// Broadcast with the sorted outcome lists of a round.
pub struct ResultsEvent {
    pub qualified: Vec<PlayerId>,
    pub disqualified: Vec<PlayerId>,
}

#[derive(Debug, Serialize)]
/// Broadcast on each countdown update.
pub struct CountdownEvent {
    pub seconds_remaining: u32,
}

#[derive(Debug, Serialize)]
/// Broadcast when the display switches screens.
pub struct PhaseScreenEvent {
    pub phase: VisibleRoundPhase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::round::Cup;

    fn config() -> RoundConfig {
        RoundConfig {
            round_number: 2,
            total_rounds: 4,
            cups: vec![
                Cup {
                    number: None,
                    has_target: false,
                },
                Cup {
                    number: None,
                    has_target: true,
                },
            ],
            qualified_players: Vec::new(),
            disqualified_players: Vec::new(),
        }
    }

    #[test]
    fn hidden_view_does_not_leak_ball_position() {
        let json = serde_json::to_value(RoundViewEvent::new(&config(), false)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "round": 2,
                "total_rounds": 4,
                "reveal": false,
                "cups": [{"number": 1}, {"number": 2}]
            })
        );
    }

    #[test]
    fn revealed_view_marks_target_cup() {
        let view = RoundViewEvent::new(&config(), true);
        assert_eq!(
            view.cups,
            vec![
                CupView {
                    number: 1,
                    has_ball: Some(false)
                },
                CupView {
                    number: 2,
                    has_ball: Some(true)
                },
            ]
        );
    }
}
