//! Per-message interaction orchestrator.
//!
//! A `MessageBubble` owns all ephemeral state for one rendered message: the drag
//! recognizer, the long-press timer, the picker state and the outside-interaction
//! listener. Timers and listeners are guards, so dropping the bubble (unmount)
//! releases every registration it holds.

use std::rc::Rc;

use tokio::time::Instant;

use crate::attachment::AttachmentResolver;
use crate::config::BubbleConfig;
use crate::events::{
    BubbleEvent, BubbleHandlers, ContextMenuOutcome, PointerButton, ReplyRequest,
};
use crate::gesture::{DragConfig, GestureMove, GestureRecognizer, GestureState, Point};
use crate::message::DisplayMessage;
use crate::picker::{
    CloseReason, OpenTrigger, PickerModel, PickerState, PickerTransition,
};
use crate::platform::{Platform, TimerGuard, TimerHandle};
use crate::press::{OutsideWatcher, PressDetector, Rect};
use crate::reaction;
use crate::render::{self, BubbleView};

/// How the current pointer session has been classified so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerSession {
    None,
    /// Down, not yet a drag or a long press.
    Pending,
    Dragging,
    /// The long press fired; the session ends without further effect.
    LongPressed,
    /// Moved past the jitter radius without dragging (e.g. scrolling).
    Moved,
}

pub struct MessageBubble {
    message: DisplayMessage,
    handlers: BubbleHandlers,
    config: BubbleConfig,
    platform: Rc<dyn Platform>,
    gesture: GestureRecognizer,
    press: PressDetector,
    outside: OutsideWatcher,
    picker: PickerState,
    session: PointerSession,
    frame: Option<TimerGuard>,
    attachments: AttachmentResolver,
}

impl MessageBubble {
    /// Mounts a bubble. Gesture state starts at rest.
    pub fn new(
        message: DisplayMessage,
        handlers: BubbleHandlers,
        config: BubbleConfig,
        platform: Rc<dyn Platform>,
    ) -> Self {
        let drag_enabled = Self::drag_enabled(&message, &handlers);
        tracing::debug!(message_id = %message.id, drag_enabled, "bubble mounted");

        Self {
            gesture: GestureRecognizer::new(DragConfig::from(&config), drag_enabled),
            press: PressDetector::new(config.long_press()),
            outside: OutsideWatcher::new(),
            picker: PickerState::Closed,
            session: PointerSession::None,
            frame: None,
            attachments: AttachmentResolver::new(),
            message,
            handlers,
            config,
            platform,
        }
    }

    fn drag_enabled(message: &DisplayMessage, handlers: &BubbleHandlers) -> bool {
        !message.is_own && handlers.can_reply()
    }

    pub fn message(&self) -> &DisplayMessage {
        &self.message
    }

    pub fn picker_state(&self) -> PickerState {
        self.picker
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker.is_open()
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture.state()
    }

    pub fn is_long_press_armed(&self) -> bool {
        self.press.is_armed()
    }

    pub fn is_listening_outside(&self) -> bool {
        self.outside.is_watching()
    }

    pub fn is_animating(&self) -> bool {
        self.frame.is_some()
    }

    /// Single entry point for host input.
    pub fn dispatch(&mut self, event: BubbleEvent, now: Instant) {
        match event {
            BubbleEvent::PointerDown { at, button } => self.pointer_down(at, button, now),
            BubbleEvent::PointerMove { at } => self.pointer_move(at),
            BubbleEvent::PointerUp => self.pointer_up(now),
            BubbleEvent::PointerCancel => self.pointer_cancel(now),
            BubbleEvent::ContextMenu => {
                self.context_menu();
            }
            BubbleEvent::DocumentPointerDown { at, button } => {
                self.document_pointer_down(at, button)
            }
            BubbleEvent::SelectReaction { emoji } => self.select_reaction(&emoji),
            BubbleEvent::SelectReply => self.select_reply(),
            BubbleEvent::Layout { bounds } => self.set_bounds(bounds),
            BubbleEvent::Render { message } => self.set_message(message),
        }
    }

    /// Replaces the snapshot. Ephemeral state survives re-renders.
    pub fn set_message(&mut self, message: DisplayMessage) {
        let drag_enabled = Self::drag_enabled(&message, &self.handlers);
        if drag_enabled != self.gesture.is_enabled() {
            tracing::debug!(message_id = %message.id, drag_enabled, "drag affordance changed");
        }
        self.gesture.set_enabled(drag_enabled);
        self.message = message;
    }

    pub fn set_handlers(&mut self, handlers: BubbleHandlers) {
        self.handlers = handlers;
        self.gesture
            .set_enabled(Self::drag_enabled(&self.message, &self.handlers));
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.outside.set_bounds(bounds);
    }

    pub fn pointer_down(&mut self, at: Point, button: PointerButton, now: Instant) {
        if !button.is_activation() {
            // Secondary buttons arrive through `context_menu`.
            return;
        }

        // A running spring is preempted by the new session.
        self.frame = None;
        self.gesture.pointer_down(at);
        self.press.press_start(&self.platform, now);
        self.session = PointerSession::Pending;
    }

    pub fn pointer_move(&mut self, at: Point) {
        match self.gesture.pointer_move(at) {
            GestureMove::DragStarted => {
                // Drag and press are exclusive for the rest of this session.
                self.press.cancel();
                self.session = PointerSession::Dragging;
            }
            GestureMove::Moved if self.session == PointerSession::Pending => {
                self.press.cancel();
                self.session = PointerSession::Moved;
            }
            GestureMove::Moved
            | GestureMove::Pending
            | GestureMove::Dragged
            | GestureMove::Ignored => {}
        }
    }

    pub fn pointer_up(&mut self, now: Instant) {
        self.press.cancel();
        let release = self.gesture.release(now);
        self.session = PointerSession::None;

        if release.reply {
            self.emit_reply();
        }
        self.schedule_frame(now);
    }

    pub fn pointer_cancel(&mut self, now: Instant) {
        self.press.cancel();
        self.gesture.cancel(now);
        self.session = PointerSession::None;
        self.schedule_frame(now);
    }

    /// Opens the picker synchronously and asks the host to suppress its native menu.
    pub fn context_menu(&mut self) -> ContextMenuOutcome {
        self.open_picker(OpenTrigger::SecondaryActivation);
        ContextMenuOutcome {
            default_prevented: true,
        }
    }

    /// Routed here by the host only while the outside listener is registered.
    pub fn document_pointer_down(&mut self, at: Point, button: PointerButton) {
        if self.outside.is_outside_activation(at, button) {
            self.close_picker(CloseReason::OutsideInteraction);
        }
    }

    /// Reports a fired timer; handles from superseded timers are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle, now: Instant) {
        if self.press.on_timer(handle) {
            if self.session == PointerSession::Pending {
                self.session = PointerSession::LongPressed;
                self.gesture.lock_session();
                self.open_picker(OpenTrigger::LongPress);
            }
            return;
        }

        if self.frame.as_ref().is_some_and(|frame| frame.is(handle)) {
            self.frame = None;
            if self.gesture.tick(now) {
                self.schedule_frame(now);
            }
            return;
        }

        tracing::trace!(?handle, "stale timer ignored");
    }

    pub fn select_reaction(&mut self, emoji: &str) {
        if !self.picker.is_open() {
            tracing::debug!(message_id = %self.message.id, emoji, "reaction ignored while picker closed");
            return;
        }

        let toggled = reaction::toggle(&self.message.id, emoji, &self.message.reactions);
        if let Some(on_react) = self.handlers.on_react.as_mut() {
            tracing::info!(
                message_id = %toggled.message_id,
                emoji = %toggled.emoji,
                action = ?toggled.action,
                "reaction toggled"
            );
            on_react(toggled);
        }
        self.close_picker(CloseReason::EmojiSelected);
    }

    pub fn select_reply(&mut self) {
        if !self.picker.is_open() {
            tracing::debug!(message_id = %self.message.id, "reply ignored while picker closed");
            return;
        }

        self.emit_reply();
        self.close_picker(CloseReason::ReplySelected);
    }

    pub fn picker_model(&self) -> Option<PickerModel> {
        self.picker.is_open().then(|| PickerModel {
            emojis: if self.handlers.can_react() {
                self.config.reactions.clone()
            } else {
                Vec::new()
            },
            show_reply: self.handlers.can_reply(),
        })
    }

    pub fn view(&mut self) -> BubbleView {
        let attachment = self
            .message
            .attachment
            .as_ref()
            .map(|attachment| self.attachments.resolve(attachment).clone());

        render::derive_view(
            &self.message,
            attachment,
            self.picker_model(),
            self.gesture.state(),
        )
    }

    fn emit_reply(&mut self) {
        let Some(on_reply) = self.handlers.on_reply.as_mut() else {
            return;
        };

        let request = ReplyRequest::for_message(&self.message);
        tracing::info!(message_id = %request.id, "reply requested");
        on_reply(request);
    }

    fn open_picker(&mut self, trigger: OpenTrigger) {
        let was_open = self.picker.is_open();
        self.apply_picker(PickerTransition::Open(trigger));
        if !was_open && self.picker.is_open() {
            self.outside.watch(&self.platform);
        }
    }

    fn close_picker(&mut self, reason: CloseReason) {
        self.apply_picker(PickerTransition::Close(reason));
        if !self.picker.is_open() {
            self.outside.unwatch();
        }
    }

    fn apply_picker(&mut self, transition: PickerTransition) {
        match self.picker.apply(transition) {
            Ok(next) => {
                if next != self.picker {
                    tracing::debug!(
                        message_id = %self.message.id,
                        from = ?self.picker,
                        to = ?next,
                        ?transition,
                        "picker transition"
                    );
                }
                self.picker = next;
            }
            Err(rejection) => {
                tracing::debug!(message_id = %self.message.id, ?rejection, "picker transition ignored");
            }
        }
    }

    fn schedule_frame(&mut self, now: Instant) {
        if self.gesture.is_animating() {
            self.frame = Some(TimerGuard::arm(
                &self.platform,
                now + self.config.frame_interval(),
            ));
        }
    }
}

impl Drop for MessageBubble {
    fn drop(&mut self) {
        if self.picker.is_open() {
            self.close_picker(CloseReason::Unmount);
        }
        self.press.cancel();
        self.frame = None;
        tracing::debug!(message_id = %self.message.id, "bubble unmounted");
    }
}

impl std::fmt::Debug for MessageBubble {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MessageBubble")
            .field("message_id", &self.message.id)
            .field("handlers", &self.handlers)
            .field("picker", &self.picker)
            .field("session", &self.session)
            .field("gesture", &self.gesture.state())
            .finish()
    }
}
