use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::{BubbleConfig, SpringConfig};
use crate::spring::{SpringAnimation, SpringStatus};

/// Pointer position in bubble-local or document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    pub reply_threshold: f32,
    pub max_drag: f32,
    pub elasticity: f32,
    pub jitter_threshold: f32,
    pub spring: SpringConfig,
}

impl From<&BubbleConfig> for DragConfig {
    fn from(config: &BubbleConfig) -> Self {
        Self {
            reply_threshold: config.reply_threshold,
            max_drag: config.max_drag,
            elasticity: config.drag_elasticity,
            jitter_threshold: config.jitter_threshold,
            spring: config.spring,
        }
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        Self::from(&BubbleConfig::default())
    }
}

/// Snapshot of the drag visuals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureState {
    /// Domain offset, always within `[0, max_drag]`.
    pub offset: f32,
    /// Rendered translation, including elastic overshoot and spring bounce.
    pub position: f32,
    pub is_dragging: bool,
}

/// Result of feeding one pointer move to the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureMove {
    /// Still within the jitter radius; nothing decided yet.
    Pending,
    /// Moved past the jitter radius without becoming a drag.
    Moved,
    /// This move classified the session as a horizontal drag.
    DragStarted,
    Dragged,
    /// No pointer session is being tracked.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureRelease {
    pub reply: bool,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Settling(SpringAnimation),
    Tracking {
        origin: Point,
        base: f32,
        /// Set once the session was claimed by a press; it can no longer drag.
        locked: bool,
    },
    Dragging {
        origin_x: f32,
        base: f32,
    },
}

/// Horizontal swipe-to-reply recognizer for one bubble.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: DragConfig,
    enabled: bool,
    phase: Phase,
    position: f32,
}

impl GestureRecognizer {
    pub fn new(config: DragConfig, enabled: bool) -> Self {
        Self {
            config,
            enabled,
            phase: Phase::Idle,
            position: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn state(&self) -> GestureState {
        GestureState {
            offset: self.offset(),
            position: self.position,
            is_dragging: matches!(self.phase, Phase::Dragging { .. }),
        }
    }

    pub fn offset(&self) -> f32 {
        self.position.clamp(0.0, self.config.max_drag)
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.phase, Phase::Tracking { .. } | Phase::Dragging { .. })
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Settling(_))
    }

    /// Starts a pointer session, preempting any running spring.
    pub fn pointer_down(&mut self, at: Point) {
        if let Phase::Settling(spring) = &self.phase {
            tracing::trace!(position = spring.position(), "spring preempted by pointer down");
        }

        self.phase = Phase::Tracking {
            origin: at,
            base: self.position,
            locked: false,
        };
    }

    /// Prevents the current session from turning into a drag.
    pub fn lock_session(&mut self) {
        if let Phase::Tracking { locked, .. } = &mut self.phase {
            *locked = true;
        }
    }

    pub fn pointer_move(&mut self, at: Point) -> GestureMove {
        let jitter = self.config.jitter_threshold;
        match self.phase {
            Phase::Tracking {
                origin,
                base,
                locked,
            } => {
                let dx = at.x - origin.x;
                let dy = at.y - origin.y;
                if self.enabled && !locked && dx.abs() > jitter {
                    self.phase = Phase::Dragging {
                        origin_x: origin.x,
                        base,
                    };
                    self.position = self.constrain(base + dx);
                    tracing::debug!(offset = self.offset(), "drag started");
                    GestureMove::DragStarted
                } else if dx.abs() > jitter || dy.abs() > jitter {
                    GestureMove::Moved
                } else {
                    GestureMove::Pending
                }
            }
            Phase::Dragging { origin_x, base } => {
                self.position = self.constrain(base + at.x - origin_x);
                tracing::trace!(offset = self.offset(), position = self.position, "drag moved");
                GestureMove::Dragged
            }
            Phase::Idle | Phase::Settling(_) => GestureMove::Ignored,
        }
    }

    /// Ends the session. A drag past the threshold asks for a reply exactly once.
    pub fn release(&mut self, now: Instant) -> GestureRelease {
        let reply = match self.phase {
            Phase::Dragging { .. } => {
                let offset = self.offset();
                let reply = self.enabled && offset > self.config.reply_threshold;
                tracing::debug!(offset, reply, "drag released");
                reply
            }
            Phase::Tracking { .. } | Phase::Idle | Phase::Settling(_) => false,
        };

        self.settle(now);
        GestureRelease { reply }
    }

    /// Aborts the session without a reply; the bubble still springs back.
    pub fn cancel(&mut self, now: Instant) {
        if matches!(self.phase, Phase::Dragging { .. }) {
            tracing::debug!(offset = self.offset(), "drag cancelled");
        }
        self.settle(now);
    }

    /// Advances the return spring; returns true while more frames are needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Phase::Settling(spring) = &mut self.phase else {
            return false;
        };

        match spring.advance(now) {
            SpringStatus::Moving(position) => {
                self.position = position;
                tracing::trace!(position, "spring frame");
                true
            }
            SpringStatus::AtRest => {
                self.position = 0.0;
                self.phase = Phase::Idle;
                tracing::trace!("spring at rest");
                false
            }
        }
    }

    /// Drops any session or animation and returns to rest immediately.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.position = 0.0;
    }

    fn settle(&mut self, now: Instant) {
        match self.phase {
            Phase::Tracking { .. } | Phase::Dragging { .. } if self.position != 0.0 => {
                self.phase = Phase::Settling(SpringAnimation::start(
                    self.config.spring,
                    self.position,
                    now,
                ));
            }
            Phase::Tracking { .. } | Phase::Dragging { .. } => self.phase = Phase::Idle,
            Phase::Idle | Phase::Settling(_) => {}
        }
    }

    fn constrain(&self, raw: f32) -> f32 {
        let max = self.config.max_drag;
        let elasticity = self.config.elasticity;
        if raw < 0.0 {
            raw * elasticity
        } else if raw > max {
            max + (raw - max) * elasticity
        } else {
            raw
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn recognizer() -> GestureRecognizer {
        GestureRecognizer::new(DragConfig::default(), true)
    }

    fn drag_to(recognizer: &mut GestureRecognizer, distance: f32) {
        recognizer.pointer_down(Point::new(10.0, 10.0));
        recognizer.pointer_move(Point::new(10.0 + distance, 10.0));
    }

    fn settle(recognizer: &mut GestureRecognizer, start: Instant) {
        let mut now = start;
        while recognizer.tick(now) {
            now += Duration::from_millis(16);
        }
    }

    #[test]
    fn release_past_threshold_requests_reply_once() {
        let mut recognizer = recognizer();
        let now = Instant::now();
        drag_to(&mut recognizer, 75.0);

        assert_eq!(recognizer.state().offset, 75.0);
        assert!(recognizer.state().is_dragging);
        assert_eq!(recognizer.release(now), GestureRelease { reply: true });
        assert!(!recognizer.state().is_dragging);
        assert_eq!(recognizer.release(now), GestureRelease { reply: false });
    }

    #[test]
    fn release_at_threshold_does_not_reply() {
        let mut recognizer = recognizer();
        drag_to(&mut recognizer, 60.0);
        assert_eq!(
            recognizer.release(Instant::now()),
            GestureRelease { reply: false }
        );
    }

    #[test]
    fn offset_stays_in_domain_while_position_overshoots() {
        let mut recognizer = recognizer();
        drag_to(&mut recognizer, 150.0);
        let state = recognizer.state();
        assert_eq!(state.offset, 100.0);
        assert_eq!(state.position, 110.0);

        recognizer.pointer_move(Point::new(-40.0, 10.0));
        let state = recognizer.state();
        assert_eq!(state.offset, 0.0);
        assert_eq!(state.position, -10.0);
    }

    #[test]
    fn spring_returns_offset_to_zero_after_release() {
        let mut recognizer = recognizer();
        let now = Instant::now();
        drag_to(&mut recognizer, 75.0);
        recognizer.release(now);

        assert!(recognizer.is_animating());
        settle(&mut recognizer, now);
        assert_eq!(recognizer.state(), GestureState::default());
    }

    #[test]
    fn jitter_does_not_start_a_drag() {
        let mut recognizer = recognizer();
        recognizer.pointer_down(Point::new(0.0, 0.0));
        assert_eq!(recognizer.pointer_move(Point::new(4.0, 3.0)), GestureMove::Pending);
        assert_eq!(recognizer.pointer_move(Point::new(2.0, 30.0)), GestureMove::Moved);
        assert_eq!(
            recognizer.pointer_move(Point::new(20.0, 0.0)),
            GestureMove::DragStarted
        );
    }

    #[test]
    fn disabled_recognizer_never_drags() {
        let mut recognizer = GestureRecognizer::new(DragConfig::default(), false);
        recognizer.pointer_down(Point::new(0.0, 0.0));
        assert_eq!(recognizer.pointer_move(Point::new(90.0, 0.0)), GestureMove::Moved);
        assert_eq!(recognizer.state().offset, 0.0);
        assert!(!recognizer.release(Instant::now()).reply);
    }

    #[test]
    fn locked_session_never_drags() {
        let mut recognizer = recognizer();
        recognizer.pointer_down(Point::new(0.0, 0.0));
        recognizer.lock_session();
        assert_eq!(recognizer.pointer_move(Point::new(90.0, 0.0)), GestureMove::Moved);
        assert!(!recognizer.release(Instant::now()).reply);
    }

    #[test]
    fn new_drag_preempts_spring_and_continues_from_current_position() {
        let mut recognizer = recognizer();
        let start = Instant::now();
        drag_to(&mut recognizer, 80.0);
        recognizer.release(start);
        recognizer.tick(start + Duration::from_millis(16));
        let mid_flight = recognizer.state().position;
        assert!(mid_flight > 0.0 && mid_flight < 80.0);

        recognizer.pointer_down(Point::new(0.0, 0.0));
        assert!(!recognizer.is_animating());
        recognizer.pointer_move(Point::new(10.0, 0.0));
        assert_eq!(recognizer.state().position, mid_flight + 10.0);
    }

    #[test]
    fn cancel_springs_back_without_reply() {
        let mut recognizer = recognizer();
        let now = Instant::now();
        drag_to(&mut recognizer, 90.0);
        recognizer.cancel(now);
        assert!(recognizer.is_animating());
        settle(&mut recognizer, now);
        assert_eq!(recognizer.offset(), 0.0);
    }
}
