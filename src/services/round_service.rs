//! Round lifecycle orchestration.
//!
//! [`RoundController`] owns every piece of mutable game state on the display
//! side. It consumes [`DisplayEvent`]s one at a time and answers with the list
//! of [`Effect`]s the runtime must carry out (commands to send, renders, timers
//! to arm or disarm). It never touches a socket, a clock or the screen itself,
//! so a test can drive it with a hand-operated clock.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    dto::{
        envelope::ClientCommand,
        round::{PlayerId, RoundConfig, RoundResult, sorted_players},
    },
    services::{
        countdown::Countdown,
        dispatcher::Inbound,
        votes::VoteTally,
        winners::{PagerStep, WinnersPage, WinnersPager},
    },
    state::state_machine::{RoundEvent, RoundPhase, RoundStateMachine, Snapshot},
};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Phase durations and timer constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTimings {
    /// Welcome countdown, in seconds.
    pub welcome_secs: u32,
    /// Voting countdown, in seconds.
    pub voting_secs: u32,
    /// Result countdown, in seconds.
    pub result_secs: u32,
    /// Game-over countdown, in seconds.
    pub game_over_secs: u32,
    /// Delay between closing the vote and sending `get_result`.
    pub swap_settle_delay: Duration,
    /// Interval of the `get_votes` poll.
    pub vote_poll_interval: Duration,
    /// Time each winners page stays on screen.
    pub winners_page_interval: Duration,
    /// Winners per page.
    pub winners_page_size: usize,
}

/// Timer slots. Each slot holds at most one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// Countdown ticks, swap settle delay and winners paging.
    Round,
    /// `get_votes` polling while voting.
    Poll,
}

/// Identity of an armed timer. A fire whose generation is stale is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    /// Slot the timer occupies.
    pub slot: TimerSlot,
    /// Arming sequence number, unique per controller.
    pub generation: u64,
}

/// Inputs of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// The game server link is open (first connection or reconnection).
    Connected,
    /// The game server link was lost.
    Disconnected,
    /// A routed server message.
    Message(Inbound),
    /// An armed timer fired.
    TimerFired(TimerId),
}

/// Render calls addressed to the presentation gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRequest {
    /// Draw the cups, with or without the balls.
    RoundView {
        /// Layout to draw.
        config: RoundConfig,
        /// Whether the cup contents are shown.
        reveal_balls: bool,
    },
    /// Update the active player counter.
    ActiveCount(u64),
    /// Show the sorted qualified and disqualified lists.
    ResultsLists {
        /// Players still in the game.
        qualified: Vec<PlayerId>,
        /// Players eliminated this round.
        disqualified: Vec<PlayerId>,
    },
    /// Update the countdown badge.
    Countdown(u32),
    /// Switch to the screen of a phase.
    PhaseScreen(RoundPhase),
    /// Show a winners page.
    WinnersPage(WinnersPage),
}

/// Side effects requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a command to the game server.
    Send(ClientCommand),
    /// Forward a render call to the presentation gateway.
    Render(RenderRequest),
    /// Arm a timer, replacing whatever occupies its slot.
    Arm {
        /// Timer identity reported back in [`DisplayEvent::TimerFired`].
        timer: TimerId,
        /// Delay before the first fire, and between fires when repeating.
        period: Duration,
        /// Keep firing every `period` until disarmed.
        repeating: bool,
    },
    /// Disarm the timer in a slot. No-op when the slot is empty.
    Disarm(TimerSlot),
}

/// Meaning of the timer currently armed in the round slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundTimer {
    Countdown,
    SwapSettle,
    WinnersPage,
}

/// Orchestrator of the round lifecycle.
#[derive(Debug)]
pub struct RoundController {
    timings: RoundTimings,
    machine: RoundStateMachine,
    votes: VoteTally,
    countdown: Countdown,
    linked: bool,
    config: Option<RoundConfig>,
    result: Option<RoundResult>,
    pager: Option<WinnersPager>,
    round_timer: Option<(u64, RoundTimer)>,
    poll_timer: Option<u64>,
    generation: u64,
}

impl RoundController {
    /// Create a controller waiting for its first connection in the welcome phase.
    pub fn new(timings: RoundTimings) -> Self {
        Self {
            timings,
            machine: RoundStateMachine::new(),
            votes: VoteTally::new(),
            countdown: Countdown::new(),
            linked: false,
            config: None,
            result: None,
            pager: None,
            round_timer: None,
            poll_timer: None,
            generation: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.machine.phase()
    }

    /// Phase and transition counter.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Votes counted in the current voting phase.
    pub fn tally(&self) -> u64 {
        self.votes.current()
    }

    /// Whether the controller believes the server link is open.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Process one event and return the effects to carry out, in order.
    pub fn handle(&mut self, event: DisplayEvent) -> Vec<Effect> {
        let mut out = Vec::new();
        match event {
            DisplayEvent::Connected => {
                info!("game server link up; restarting from welcome");
                self.linked = true;
                self.enter_welcome(RoundEvent::Reconnected, &mut out);
            }
            DisplayEvent::Disconnected => {
                warn!(phase = ?self.phase(), "game server link lost; freezing server-driven progress");
                self.linked = false;
                self.stop_polling(&mut out);
            }
            DisplayEvent::Message(inbound) => self.on_message(inbound, &mut out),
            DisplayEvent::TimerFired(timer) => self.on_timer(timer, &mut out),
        }
        out
    }

    fn on_message(&mut self, inbound: Inbound, out: &mut Vec<Effect>) {
        let phase = self.phase();
        match inbound {
            Inbound::Config(_) if phase == RoundPhase::Winners => {
                debug!("ignoring round config during winners showcase");
            }
            Inbound::Config(config) => {
                let count = if phase == RoundPhase::Voting {
                    self.votes.current()
                } else {
                    config.participant_count()
                };
                out.push(Effect::Render(RenderRequest::RoundView {
                    config: config.clone(),
                    reveal_balls: false,
                }));
                out.push(Effect::Render(RenderRequest::ActiveCount(count)));
                self.config = Some(config);
            }
            Inbound::Votes(delta) if phase == RoundPhase::Voting => {
                let total = self.votes.add(delta);
                out.push(Effect::Render(RenderRequest::ActiveCount(total)));
            }
            Inbound::Votes(delta) => {
                debug!(delta, phase = ?phase, "ignoring votes outside voting phase");
            }
            Inbound::Result(result)
                if phase == RoundPhase::Revealing && self.result.is_none() =>
            {
                self.reveal(result, out);
            }
            Inbound::Result(_) => {
                debug!(phase = ?phase, "ignoring unexpected round result");
            }
        }
    }

    fn on_timer(&mut self, timer: TimerId, out: &mut Vec<Effect>) {
        match timer.slot {
            TimerSlot::Poll => {
                if self.poll_timer != Some(timer.generation) {
                    debug!(generation = timer.generation, "discarding stale poll timer");
                    return;
                }
                self.send(ClientCommand::GetVotes, out);
            }
            TimerSlot::Round => {
                let Some((generation, kind)) = self.round_timer else {
                    debug!(generation = timer.generation, "discarding stale round timer");
                    return;
                };
                if generation != timer.generation {
                    debug!(generation = timer.generation, "discarding stale round timer");
                    return;
                }
                match kind {
                    RoundTimer::Countdown => self.on_countdown_tick(out),
                    RoundTimer::SwapSettle => self.on_swap_settled(out),
                    RoundTimer::WinnersPage => self.on_winners_page_elapsed(out),
                }
            }
        }
    }

    fn on_countdown_tick(&mut self, out: &mut Vec<Effect>) {
        let Some(tick) = self.countdown.tick() else {
            return;
        };
        out.push(Effect::Render(RenderRequest::Countdown(tick.remaining)));
        if !tick.completed {
            return;
        }

        self.clear_round_timer(out);
        match self.phase() {
            RoundPhase::Welcome => self.enter_voting(RoundEvent::WelcomeElapsed, out),
            RoundPhase::Voting => self.enter_swapping(out),
            RoundPhase::Revealing => self.finish_reveal(out),
            RoundPhase::GameOver => self.enter_welcome(RoundEvent::Restart, out),
            phase => warn!(phase = ?phase, "countdown completed in a phase without countdown"),
        }
    }

    fn enter_welcome(&mut self, event: RoundEvent, out: &mut Vec<Effect>) {
        self.clear_round_timer(out);
        self.stop_polling(out);
        self.result = None;
        self.pager = None;
        if !self.transition(event) {
            return;
        }

        self.send(ClientCommand::GetConfig, out);
        out.push(Effect::Render(RenderRequest::PhaseScreen(RoundPhase::Welcome)));
        self.start_countdown(self.timings.welcome_secs, out);
    }

    fn enter_voting(&mut self, event: RoundEvent, out: &mut Vec<Effect>) {
        if !self.transition(event) {
            return;
        }
        self.votes.reset();
        self.result = None;

        self.send(ClientCommand::GetConfig, out);
        out.push(Effect::Render(RenderRequest::PhaseScreen(RoundPhase::Voting)));
        if let Some(config) = &self.config {
            out.push(Effect::Render(RenderRequest::RoundView {
                config: config.clone(),
                reveal_balls: false,
            }));
        }
        self.start_polling(out);
        self.start_countdown(self.timings.voting_secs, out);
    }

    fn enter_swapping(&mut self, out: &mut Vec<Effect>) {
        self.stop_polling(out);
        if !self.transition(RoundEvent::VotingClosed) {
            return;
        }
        info!(votes = self.votes.current(), "voting closed");

        out.push(Effect::Render(RenderRequest::PhaseScreen(RoundPhase::Swapping)));
        self.arm_round(
            RoundTimer::SwapSettle,
            self.timings.swap_settle_delay,
            false,
            out,
        );
    }

    fn on_swap_settled(&mut self, out: &mut Vec<Effect>) {
        self.clear_round_timer(out);
        self.send(ClientCommand::GetResult, out);
        if self.transition(RoundEvent::ResultRequested) {
            out.push(Effect::Render(RenderRequest::PhaseScreen(
                RoundPhase::Revealing,
            )));
        }
    }

    fn reveal(&mut self, result: RoundResult, out: &mut Vec<Effect>) {
        out.push(Effect::Render(RenderRequest::RoundView {
            config: result.config.clone(),
            reveal_balls: true,
        }));
        out.push(Effect::Render(RenderRequest::ResultsLists {
            qualified: sorted_players(&result.config.qualified_players),
            disqualified: sorted_players(&result.config.disqualified_players),
        }));
        out.push(Effect::Render(RenderRequest::ActiveCount(
            result.config.participant_count(),
        )));

        info!(
            round = result.config.round_number,
            total_rounds = result.config.total_rounds,
            qualified = result.config.qualified_players.len(),
            disqualified = result.config.disqualified_players.len(),
            "revealing round result"
        );
        self.config = Some(result.config.clone());
        self.result = Some(result);
        self.start_countdown(self.timings.result_secs, out);
    }

    fn finish_reveal(&mut self, out: &mut Vec<Effect>) {
        let Some(result) = self.result.take() else {
            warn!("reveal countdown completed without a result");
            return;
        };

        if result.game_over && result.game_finished {
            warn!("result flags both game over and game finished; treating as game over");
        }

        if result.game_over {
            self.send(ClientCommand::Reset, out);
            if self.transition(RoundEvent::GameOver) {
                out.push(Effect::Render(RenderRequest::PhaseScreen(
                    RoundPhase::GameOver,
                )));
                self.start_countdown(self.timings.game_over_secs, out);
            }
        } else if result.game_finished {
            self.send(ClientCommand::Reset, out);
            self.enter_winners(&result.config.qualified_players, out);
        } else {
            self.send(ClientCommand::NextRound, out);
            self.enter_voting(RoundEvent::NextRound, out);
        }
    }

    fn enter_winners(&mut self, winners: &[PlayerId], out: &mut Vec<Effect>) {
        if !self.transition(RoundEvent::GameFinished) {
            return;
        }

        let pager = WinnersPager::new(winners, self.timings.winners_page_size);
        info!(
            winners = winners.len(),
            pages = pager.total_pages(),
            "showcasing winners"
        );
        out.push(Effect::Render(RenderRequest::PhaseScreen(RoundPhase::Winners)));
        out.push(Effect::Render(RenderRequest::WinnersPage(
            pager.current_page(),
        )));
        self.pager = Some(pager);
        self.arm_round(
            RoundTimer::WinnersPage,
            self.timings.winners_page_interval,
            true,
            out,
        );
    }

    fn on_winners_page_elapsed(&mut self, out: &mut Vec<Effect>) {
        let step = match self.pager.as_mut() {
            Some(pager) => pager.advance(),
            None => PagerStep::Finished,
        };
        match step {
            PagerStep::Page(page) => out.push(Effect::Render(RenderRequest::WinnersPage(page))),
            PagerStep::Finished => self.enter_welcome(RoundEvent::Restart, out),
        }
    }

    fn start_countdown(&mut self, seconds: u32, out: &mut Vec<Effect>) {
        if self.countdown.start(seconds) {
            debug!("replacing active countdown");
        }
        out.push(Effect::Render(RenderRequest::Countdown(seconds)));
        self.arm_round(RoundTimer::Countdown, COUNTDOWN_TICK, true, out);
    }

    fn arm_round(
        &mut self,
        kind: RoundTimer,
        period: Duration,
        repeating: bool,
        out: &mut Vec<Effect>,
    ) {
        if kind != RoundTimer::Countdown {
            self.countdown.cancel();
        }
        let generation = self.next_generation();
        self.round_timer = Some((generation, kind));
        out.push(Effect::Arm {
            timer: TimerId {
                slot: TimerSlot::Round,
                generation,
            },
            period,
            repeating,
        });
    }

    fn clear_round_timer(&mut self, out: &mut Vec<Effect>) {
        self.countdown.cancel();
        if self.round_timer.take().is_some() {
            out.push(Effect::Disarm(TimerSlot::Round));
        }
    }

    fn start_polling(&mut self, out: &mut Vec<Effect>) {
        if !self.linked {
            debug!("link down; not polling votes");
            return;
        }
        let generation = self.next_generation();
        self.poll_timer = Some(generation);
        out.push(Effect::Arm {
            timer: TimerId {
                slot: TimerSlot::Poll,
                generation,
            },
            period: self.timings.vote_poll_interval,
            repeating: true,
        });
    }

    fn stop_polling(&mut self, out: &mut Vec<Effect>) {
        if self.poll_timer.take().is_some() {
            out.push(Effect::Disarm(TimerSlot::Poll));
        }
    }

    fn send(&self, command: ClientCommand, out: &mut Vec<Effect>) {
        if self.linked {
            out.push(Effect::Send(command));
        } else {
            debug!(command = command.as_str(), "link down; dropping command");
        }
    }

    fn transition(&mut self, event: RoundEvent) -> bool {
        let from = self.phase();
        match self.machine.apply(event) {
            Ok(to) => {
                info!(from = ?from, to = ?to, event = ?event, "phase changed");
                true
            }
            Err(err) => {
                warn!(error = %err, "rejected phase transition");
                false
            }
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}
