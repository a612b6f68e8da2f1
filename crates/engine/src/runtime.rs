use std::rc::Rc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::bubble::MessageBubble;
use crate::config::BubbleConfig;
use crate::events::{BubbleEvent, BubbleHandlers};
use crate::message::DisplayMessage;
use crate::platform::{LoopPlatform, Platform};
use crate::render::BubbleView;

/// Drives one bubble from a channel of host events on the current task.
///
/// Timers armed by the bubble become `sleep_until` deadlines. The loop is
/// single-threaded; the bubble never leaves the task that runs it.
pub struct BubbleRuntime {
    platform: Rc<LoopPlatform>,
    bubble: MessageBubble,
}

impl BubbleRuntime {
    pub fn new(message: DisplayMessage, handlers: BubbleHandlers, config: BubbleConfig) -> Self {
        let platform = LoopPlatform::new();
        let dyn_platform: Rc<dyn Platform> = platform.clone();
        Self {
            bubble: MessageBubble::new(message, handlers, config, dyn_platform),
            platform,
        }
    }

    pub fn platform(&self) -> Rc<LoopPlatform> {
        Rc::clone(&self.platform)
    }

    pub fn bubble(&self) -> &MessageBubble {
        &self.bubble
    }

    /// Processes events until the sender side closes, then unmounts the bubble.
    ///
    /// Returns the last view rendered before unmount.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<BubbleEvent>) -> BubbleView {
        tracing::debug!(message_id = %self.bubble.message().id, "bubble runtime started");

        loop {
            let deadline = self.platform.next_deadline().map(|(_, deadline)| deadline);

            tokio::select! {
                received = events.recv() => match received {
                    Some(event) => self.deliver(event),
                    None => break,
                },
                () = sleep_until(deadline), if deadline.is_some() => {
                    self.fire_due(Instant::now());
                }
            }
        }

        let view = self.bubble.view();
        tracing::debug!(message_id = %view.id, "bubble runtime stopped");
        view
    }

    fn deliver(&mut self, event: BubbleEvent) {
        if matches!(event, BubbleEvent::DocumentPointerDown { .. }) && !self.platform.is_listening()
        {
            return;
        }

        // Deadlines that passed while we were waiting on the channel fire first.
        let now = Instant::now();
        self.fire_due(now);
        self.bubble.dispatch(event, now);
    }

    fn fire_due(&mut self, now: Instant) {
        while let Some(handle) = self.platform.take_due(now) {
            self.bubble.on_timer(handle, now);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
