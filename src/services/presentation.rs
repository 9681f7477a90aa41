//! Presentation gateway: the render calls the round controller relies on.
//!
//! Drawing happens outside this crate. [`SsePresentation`] publishes every
//! render call as a named SSE event for the browser renderer.

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        round::{PlayerId, RoundConfig},
        sse::{
            ActiveCountEvent, CountdownEvent, PhaseScreenEvent, ResultsEvent, RoundViewEvent,
            ServerEvent,
        },
    },
    services::{round_service::RenderRequest, winners::WinnersPage},
    state::{SharedState, state_machine::RoundPhase},
};

const EVENT_ROUND_VIEW: &str = "round_view";
const EVENT_ACTIVE_COUNT: &str = "active_count";
const EVENT_RESULTS: &str = "results";
const EVENT_COUNTDOWN: &str = "countdown";
const EVENT_PHASE: &str = "phase";
const EVENT_WINNERS_PAGE: &str = "winners_page";

/// Rendering surface driven by the round controller. Write-only.
pub trait PresentationGateway: Send {
    /// Draw the cups of `config`, showing the balls when `reveal_balls` is set.
    fn render_round_view(&self, config: &RoundConfig, reveal_balls: bool);
    /// Update the active player counter.
    fn render_active_count(&self, count: u64);
    /// Show the sorted outcome lists.
    fn render_results_lists(&self, qualified: &[PlayerId], disqualified: &[PlayerId]);
    /// Update the countdown badge.
    fn render_countdown(&self, seconds_remaining: u32);
    /// Switch to the screen of `phase`.
    fn show_phase_screen(&self, phase: RoundPhase);
    /// Show one page of the winners showcase.
    fn render_winners_page(&self, page: &WinnersPage);
}

/// Route a render request to the matching gateway call.
pub fn present<P: PresentationGateway + ?Sized>(gateway: &P, request: &RenderRequest) {
    match request {
        RenderRequest::RoundView {
            config,
            reveal_balls,
        } => gateway.render_round_view(config, *reveal_balls),
        RenderRequest::ActiveCount(count) => gateway.render_active_count(*count),
        RenderRequest::ResultsLists {
            qualified,
            disqualified,
        } => gateway.render_results_lists(qualified, disqualified),
        RenderRequest::Countdown(seconds) => gateway.render_countdown(*seconds),
        RenderRequest::PhaseScreen(phase) => gateway.show_phase_screen(*phase),
        RenderRequest::WinnersPage(page) => gateway.render_winners_page(page),
    }
}

/// Gateway publishing render calls on the display SSE stream.
pub struct SsePresentation {
    state: SharedState,
}

impl SsePresentation {
    /// Publish through the display hub of `state`.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn send_display_event(&self, event: &str, payload: &impl Serialize) {
        match ServerEvent::json(Some(event.to_string()), payload) {
            // A new screen makes every other retained render stale.
            Ok(message) => self
                .state
                .display_sse()
                .broadcast_retained(message, event == EVENT_PHASE),
            Err(err) => warn!(event, error = %err, "failed to serialize display SSE payload"),
        }
    }
}

impl PresentationGateway for SsePresentation {
    fn render_round_view(&self, config: &RoundConfig, reveal_balls: bool) {
        self.send_display_event(EVENT_ROUND_VIEW, &RoundViewEvent::new(config, reveal_balls));
    }

    fn render_active_count(&self, count: u64) {
        self.send_display_event(EVENT_ACTIVE_COUNT, &ActiveCountEvent { count });
    }

    fn render_results_lists(&self, qualified: &[PlayerId], disqualified: &[PlayerId]) {
        let payload = ResultsEvent {
            qualified: qualified.to_vec(),
            disqualified: disqualified.to_vec(),
        };
        self.send_display_event(EVENT_RESULTS, &payload);
    }

    fn render_countdown(&self, seconds_remaining: u32) {
        self.send_display_event(EVENT_COUNTDOWN, &CountdownEvent { seconds_remaining });
    }

    fn show_phase_screen(&self, phase: RoundPhase) {
        let payload = PhaseScreenEvent {
            phase: phase.into(),
        };
        self.send_display_event(EVENT_PHASE, &payload);
    }

    fn render_winners_page(&self, page: &WinnersPage) {
        self.send_display_event(EVENT_WINNERS_PAGE, page);
    }
}
