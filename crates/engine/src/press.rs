use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::events::PointerButton;
use crate::gesture::Point;
use crate::platform::{ListenerGuard, Platform, TimerGuard, TimerHandle};

/// Axis-aligned bounds in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Edges are inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Long-press timer for one bubble.
///
/// At most one deadline is armed; arming again supersedes the previous one.
#[derive(Debug)]
pub struct PressDetector {
    long_press: Duration,
    timer: Option<TimerGuard>,
}

impl PressDetector {
    pub fn new(long_press: Duration) -> Self {
        Self {
            long_press,
            timer: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(TimerGuard::deadline)
    }

    pub fn press_start(&mut self, platform: &Rc<dyn Platform>, now: Instant) {
        // Assigning drops the superseded guard, which disarms its timer.
        self.timer = Some(TimerGuard::arm(platform, now + self.long_press));
        tracing::trace!(deadline_ms = self.long_press.as_millis() as u64, "long press armed");
    }

    /// Disarms a pending press. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.timer.take().is_some();
        if was_armed {
            tracing::trace!("long press disarmed");
        }
        was_armed
    }

    /// Consumes an expired timer. True when it was this detector's deadline.
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        if self.timer.as_ref().is_some_and(|timer| timer.is(handle)) {
            self.timer = None;
            true
        } else {
            false
        }
    }
}

/// Document-level watcher that reports activations outside the bubble.
///
/// The listener is held only between `watch` and `unwatch`.
#[derive(Debug, Default)]
pub struct OutsideWatcher {
    bounds: Option<Rect>,
    listener: Option<ListenerGuard>,
}

impl OutsideWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn is_watching(&self) -> bool {
        self.listener.is_some()
    }

    pub fn watch(&mut self, platform: &Rc<dyn Platform>) {
        if self.listener.is_none() {
            self.listener = Some(ListenerGuard::listen(platform));
            tracing::trace!("outside listener registered");
        }
    }

    pub fn unwatch(&mut self) {
        if self.listener.take().is_some() {
            tracing::trace!("outside listener released");
        }
    }

    /// True for a primary or touch activation whose target lies outside the bounds.
    ///
    /// Without known bounds every activation counts as outside.
    pub fn is_outside_activation(&self, at: Point, button: PointerButton) -> bool {
        self.is_watching()
            && button.is_activation()
            && !self.bounds.is_some_and(|bounds| bounds.contains(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::LoopPlatform;

    fn platform() -> (Rc<LoopPlatform>, Rc<dyn Platform>) {
        let loop_platform = LoopPlatform::new();
        let platform: Rc<dyn Platform> = loop_platform.clone();
        (loop_platform, platform)
    }

    #[test]
    fn rearming_supersedes_the_previous_deadline() {
        let (loop_platform, platform) = platform();
        let mut press = PressDetector::new(Duration::from_millis(500));
        let now = Instant::now();

        press.press_start(&platform, now);
        press.press_start(&platform, now + Duration::from_millis(100));
        assert_eq!(loop_platform.active_timers(), 1);
        assert_eq!(press.deadline(), Some(now + Duration::from_millis(600)));
    }

    #[test]
    fn cancel_releases_the_timer() {
        let (loop_platform, platform) = platform();
        let mut press = PressDetector::new(Duration::from_millis(500));
        press.press_start(&platform, Instant::now());

        assert!(press.cancel());
        assert!(!press.cancel());
        assert_eq!(loop_platform.active_timers(), 0);
    }

    #[test]
    fn only_its_own_timer_counts_as_long_press() {
        let (loop_platform, platform) = platform();
        let mut press = PressDetector::new(Duration::from_millis(500));
        let now = Instant::now();
        press.press_start(&platform, now);

        assert!(!press.on_timer(TimerHandle(9_999)));
        let due = loop_platform
            .take_due(now + Duration::from_millis(500))
            .expect("deadline reached");
        assert!(press.on_timer(due));
        assert!(!press.is_armed());
    }

    #[test]
    fn outside_activation_respects_bounds_and_button() {
        let (loop_platform, platform) = platform();
        let mut watcher = OutsideWatcher::new();
        watcher.set_bounds(Rect::new(0.0, 0.0, 100.0, 40.0));

        let outside = Point::new(150.0, 10.0);
        assert!(!watcher.is_outside_activation(outside, PointerButton::Primary));

        watcher.watch(&platform);
        watcher.watch(&platform);
        assert_eq!(loop_platform.active_listeners(), 1);
        assert!(watcher.is_outside_activation(outside, PointerButton::Touch));
        assert!(!watcher.is_outside_activation(outside, PointerButton::Secondary));
        assert!(!watcher.is_outside_activation(Point::new(100.0, 40.0), PointerButton::Primary));

        watcher.unwatch();
        assert_eq!(loop_platform.active_listeners(), 0);
    }

    #[test]
    fn unknown_bounds_treat_everything_as_outside() {
        let (_loop_platform, platform) = platform();
        let mut watcher = OutsideWatcher::new();
        watcher.watch(&platform);
        assert!(watcher.is_outside_activation(Point::new(1.0, 1.0), PointerButton::Primary));
    }
}
