//! Deterministic virtual-clock driver.
//!
//! Events carry millisecond offsets from mount. Between events every armed timer
//! whose deadline has passed fires at exactly its deadline, so long-press and
//! spring behaviour is reproducible without waiting on a real clock.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::bubble::MessageBubble;
use crate::config::BubbleConfig;
use crate::events::{BubbleEvent, BubbleHandlers, BubbleIntent, ReactionToggled};
use crate::message::DisplayMessage;
use crate::platform::{LoopPlatform, Platform};
use crate::reaction;
use crate::render::BubbleView;

/// Upper bound on timer firings per `settle`, guarding against a runaway loop.
const MAX_SETTLE_FIRINGS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub at_ms: u64,
    pub event: BubbleEvent,
}

impl ScheduledEvent {
    pub fn new(at_ms: u64, event: BubbleEvent) -> Self {
        Self { at_ms, event }
    }
}

/// Shared record of every intent a bubble emitted, in order.
#[derive(Debug, Clone, Default)]
pub struct IntentLog {
    intents: Rc<RefCell<Vec<BubbleIntent>>>,
}

impl IntentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers that append to this log. Disabled ones are left unset.
    pub fn handlers(&self, react: bool, reply: bool) -> BubbleHandlers {
        let mut handlers = BubbleHandlers::new();
        if react {
            let intents = Rc::clone(&self.intents);
            handlers = handlers
                .on_react(move |toggled| intents.borrow_mut().push(BubbleIntent::React(toggled)));
        }
        if reply {
            let intents = Rc::clone(&self.intents);
            handlers = handlers
                .on_reply(move |request| intents.borrow_mut().push(BubbleIntent::Reply(request)));
        }
        handlers
    }

    pub fn snapshot(&self) -> Vec<BubbleIntent> {
        self.intents.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.intents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.borrow().is_empty()
    }
}

pub struct Simulation {
    platform: Rc<LoopPlatform>,
    bubble: Option<MessageBubble>,
    log: IntentLog,
    origin: Instant,
    now: Instant,
    reflect_reactions: bool,
    reflected: usize,
}

impl Simulation {
    /// Mounts a bubble whose handlers record into the simulation's log.
    pub fn new(message: DisplayMessage, config: BubbleConfig, react: bool, reply: bool) -> Self {
        let log = IntentLog::new();
        let handlers = log.handlers(react, reply);
        Self::with_handlers(message, config, handlers, log)
    }

    pub fn with_handlers(
        message: DisplayMessage,
        config: BubbleConfig,
        handlers: BubbleHandlers,
        log: IntentLog,
    ) -> Self {
        let platform = LoopPlatform::new();
        let dyn_platform: Rc<dyn Platform> = platform.clone();
        let origin = Instant::now();

        Self {
            bubble: Some(MessageBubble::new(message, handlers, config, dyn_platform)),
            platform,
            log,
            origin,
            now: origin,
            reflect_reactions: false,
            reflected: 0,
        }
    }

    /// Plays the upstream owner: reaction intents are folded into the snapshot and
    /// re-rendered, as a real message store would.
    pub fn reflecting_reactions(mut self) -> Self {
        self.reflect_reactions = true;
        self
    }

    pub fn platform(&self) -> &Rc<LoopPlatform> {
        &self.platform
    }

    pub fn bubble(&self) -> Option<&MessageBubble> {
        self.bubble.as_ref()
    }

    pub fn bubble_mut(&mut self) -> Option<&mut MessageBubble> {
        self.bubble.as_mut()
    }

    pub fn intents(&self) -> Vec<BubbleIntent> {
        self.log.snapshot()
    }

    pub fn elapsed(&self) -> Duration {
        self.now.saturating_duration_since(self.origin)
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Fires every timer due up to `at` (from mount), each at its own deadline.
    pub fn advance_to(&mut self, at: Duration) {
        let target = self.origin + at;
        while let Some((_, deadline)) = self.platform.next_deadline() {
            if deadline > target {
                break;
            }
            self.now = self.now.max(deadline);
            self.fire_due();
        }
        self.now = self.now.max(target);
    }

    pub fn advance_by(&mut self, delta: Duration) {
        let at = self.elapsed() + delta;
        self.advance_to(at);
    }

    /// Delivers one event at the current virtual time.
    ///
    /// Document pointer-downs reach the bubble only while it holds an outside
    /// listener, the same way a host would route them.
    pub fn send(&mut self, event: BubbleEvent) {
        let now = self.now;
        let Some(bubble) = self.bubble.as_mut() else {
            tracing::debug!(?event, "event after unmount dropped");
            return;
        };

        if matches!(event, BubbleEvent::DocumentPointerDown { .. }) && !self.platform.is_listening()
        {
            return;
        }

        bubble.dispatch(event, now);
        self.reflect();
    }

    pub fn run(&mut self, events: &[ScheduledEvent]) {
        for scheduled in events {
            self.advance_to(Duration::from_millis(scheduled.at_ms));
            self.send(scheduled.event.clone());
        }
    }

    /// Runs timers until none remain armed (e.g. the return spring has settled).
    pub fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_FIRINGS {
            let Some((_, deadline)) = self.platform.next_deadline() else {
                return;
            };
            self.now = self.now.max(deadline);
            self.fire_due();
        }
        tracing::warn!("simulation did not settle after {MAX_SETTLE_FIRINGS} timer firings");
    }

    pub fn view(&mut self) -> Option<BubbleView> {
        self.bubble.as_mut().map(MessageBubble::view)
    }

    /// Drops the bubble, releasing whatever it still holds.
    pub fn unmount(&mut self) {
        self.bubble = None;
    }

    fn fire_due(&mut self) {
        let now = self.now;
        while let Some(handle) = self.platform.take_due(now) {
            if let Some(bubble) = self.bubble.as_mut() {
                bubble.on_timer(handle, now);
            }
        }
        self.reflect();
    }

    fn reflect(&mut self) {
        if !self.reflect_reactions {
            return;
        }

        let intents = self.log.snapshot();
        let pending = intents
            .iter()
            .skip(self.reflected)
            .filter_map(|intent| match intent {
                BubbleIntent::React(toggled) => Some(toggled),
                BubbleIntent::Reply(_) => None,
            })
            .collect::<Vec<&ReactionToggled>>();
        self.reflected = intents.len();

        if pending.is_empty() {
            return;
        }
        let Some(bubble) = self.bubble.as_mut() else {
            return;
        };

        let mut message = bubble.message().clone();
        for toggled in pending {
            message.reactions = reaction::apply_toggle(&message.reactions, toggled);
        }
        bubble.set_message(message);
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Simulation")
            .field("elapsed", &self.elapsed())
            .field("bubble", &self.bubble)
            .field("intents", &self.log.len())
            .finish()
    }
}
