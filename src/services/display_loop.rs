//! Runtime driving the round controller from link events and timer fires.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    services::{
        connection::{CommandSender, LinkEvent},
        dispatcher,
        presentation::{PresentationGateway, present},
        round_service::{DisplayEvent, Effect, RoundController, TimerId},
        timers::TimerWheel,
    },
    state::SharedState,
};

/// Single consumer of every event the controller reacts to.
///
/// Events are handled one at a time, so the controller never observes
/// interleaved updates.
pub struct DisplayLoop<P> {
    controller: RoundController,
    presentation: P,
    commands: CommandSender,
    wheel: TimerWheel,
    fired: mpsc::UnboundedReceiver<TimerId>,
    state: SharedState,
}

impl<P: PresentationGateway> DisplayLoop<P> {
    /// Assemble a loop around `controller`.
    pub fn new(
        controller: RoundController,
        presentation: P,
        commands: CommandSender,
        state: SharedState,
    ) -> Self {
        let (wheel, fired) = TimerWheel::new();
        Self {
            controller,
            presentation,
            commands,
            wheel,
            fired,
            state,
        }
    }

    /// Consume link events and timer fires until the connection manager stops.
    pub async fn run(mut self, mut link_events: mpsc::UnboundedReceiver<LinkEvent>) {
        info!("display loop started");
        loop {
            let event = tokio::select! {
                link_event = link_events.recv() => match link_event {
                    Some(link_event) => match self.translate(link_event) {
                        Some(event) => event,
                        None => continue,
                    },
                    None => break,
                },
                Some(timer) = self.fired.recv() => DisplayEvent::TimerFired(timer),
            };

            self.dispatch(event).await;
        }

        self.wheel.disarm_all();
        info!("display loop stopped");
    }

    fn translate(&self, event: LinkEvent) -> Option<DisplayEvent> {
        match event {
            LinkEvent::Connected => Some(DisplayEvent::Connected),
            LinkEvent::Disconnected => Some(DisplayEvent::Disconnected),
            LinkEvent::Message(text) => match dispatcher::decode(&text) {
                Ok(inbound) => inbound.map(DisplayEvent::Message),
                Err(err) => {
                    warn!(error = %err, "dropping server message");
                    None
                }
            },
        }
    }

    async fn dispatch(&mut self, event: DisplayEvent) {
        for effect in self.controller.handle(event) {
            self.execute(effect);
        }
        self.state.publish_snapshot(self.controller.snapshot()).await;
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Send(command) => {
                if !self.commands.send(command) {
                    debug!(command = command.as_str(), "command not delivered");
                }
            }
            Effect::Render(request) => present(&self.presentation, &request),
            Effect::Arm {
                timer,
                period,
                repeating,
            } => self.wheel.arm(timer, period, repeating),
            Effect::Disarm(slot) => self.wheel.disarm(slot),
        }
    }
}
