//! Host seam for the two resources a bubble acquires from its environment:
//! one-shot timers (long-press deadline, animation frames) and the
//! document-level listener that watches for interaction outside the bubble.
//!
//! Both are handed out as guards. Dropping a guard releases the registration,
//! so every exit path (state change, superseding event, unmount) releases it.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(pub u64);

pub trait Platform {
    /// Schedules a one-shot timer. The host reports expiry via `MessageBubble::on_timer`.
    fn arm_timer(&self, deadline: Instant) -> TimerHandle;
    /// Cancels a timer. Unknown or already fired handles are ignored.
    fn disarm_timer(&self, handle: TimerHandle);
    /// Starts forwarding document pointer-downs to the bubble.
    fn listen_outside(&self) -> ListenerHandle;
    fn unlisten_outside(&self, handle: ListenerHandle);
}

/// Armed timer; disarmed on drop.
pub struct TimerGuard {
    platform: Rc<dyn Platform>,
    handle: TimerHandle,
    deadline: Instant,
}

impl TimerGuard {
    pub fn arm(platform: &Rc<dyn Platform>, deadline: Instant) -> Self {
        let handle = platform.arm_timer(deadline);
        Self {
            platform: Rc::clone(platform),
            handle,
            deadline,
        }
    }

    pub fn handle(&self) -> TimerHandle {
        self.handle
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is(&self, handle: TimerHandle) -> bool {
        self.handle == handle
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.platform.disarm_timer(self.handle);
    }
}

impl fmt::Debug for TimerGuard {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TimerGuard")
            .field("handle", &self.handle)
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Registered outside-interaction listener; unregistered on drop.
pub struct ListenerGuard {
    platform: Rc<dyn Platform>,
    handle: ListenerHandle,
}

impl ListenerGuard {
    pub fn listen(platform: &Rc<dyn Platform>) -> Self {
        let handle = platform.listen_outside();
        Self {
            platform: Rc::clone(platform),
            handle,
        }
    }

    pub fn handle(&self) -> ListenerHandle {
        self.handle
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.platform.unlisten_outside(self.handle);
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ListenerGuard")
            .field("handle", &self.handle)
            .finish()
    }
}

#[derive(Debug, Default)]
struct LoopState {
    next_id: u64,
    timers: BTreeMap<TimerHandle, Instant>,
    listeners: BTreeSet<ListenerHandle>,
}

impl LoopState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Single-threaded timer table and listener registry shared by the event loops.
#[derive(Debug, Default)]
pub struct LoopPlatform {
    state: RefCell<LoopState>,
}

impl LoopPlatform {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Earliest armed timer; ties resolve in arming order.
    pub fn next_deadline(&self) -> Option<(TimerHandle, Instant)> {
        self.state
            .borrow()
            .timers
            .iter()
            .min_by_key(|(handle, deadline)| (**deadline, **handle))
            .map(|(handle, deadline)| (*handle, *deadline))
    }

    /// Removes and returns the earliest timer whose deadline is not after `now`.
    pub fn take_due(&self, now: Instant) -> Option<TimerHandle> {
        let (handle, deadline) = self.next_deadline()?;
        if deadline > now {
            return None;
        }

        self.state.borrow_mut().timers.remove(&handle);
        Some(handle)
    }

    pub fn active_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn active_listeners(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn is_listening(&self) -> bool {
        !self.state.borrow().listeners.is_empty()
    }
}

impl Platform for LoopPlatform {
    fn arm_timer(&self, deadline: Instant) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = TimerHandle(state.next_id());
        state.timers.insert(handle, deadline);
        handle
    }

    fn disarm_timer(&self, handle: TimerHandle) {
        self.state.borrow_mut().timers.remove(&handle);
    }

    fn listen_outside(&self) -> ListenerHandle {
        let mut state = self.state.borrow_mut();
        let handle = ListenerHandle(state.next_id());
        state.listeners.insert(handle);
        handle
    }

    fn unlisten_outside(&self, handle: ListenerHandle) {
        self.state.borrow_mut().listeners.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn dropping_guards_releases_registrations() {
        let loop_platform = LoopPlatform::new();
        let platform: Rc<dyn Platform> = loop_platform.clone();
        let now = Instant::now();

        let timer = TimerGuard::arm(&platform, now + Duration::from_millis(500));
        let listener = ListenerGuard::listen(&platform);
        assert_eq!(loop_platform.active_timers(), 1);
        assert!(loop_platform.is_listening());

        drop(timer);
        drop(listener);
        assert_eq!(loop_platform.active_timers(), 0);
        assert_eq!(loop_platform.active_listeners(), 0);
    }

    #[test]
    fn due_timers_come_out_in_deadline_order() {
        let loop_platform = LoopPlatform::new();
        let now = Instant::now();
        let late = loop_platform.arm_timer(now + Duration::from_millis(30));
        let early = loop_platform.arm_timer(now + Duration::from_millis(10));

        assert_eq!(loop_platform.take_due(now), None);
        assert_eq!(
            loop_platform.take_due(now + Duration::from_millis(40)),
            Some(early)
        );
        assert_eq!(
            loop_platform.take_due(now + Duration::from_millis(40)),
            Some(late)
        );
        assert_eq!(loop_platform.active_timers(), 0);
    }

    #[test]
    fn disarming_a_fired_timer_is_harmless() {
        let loop_platform = LoopPlatform::new();
        let platform: Rc<dyn Platform> = loop_platform.clone();
        let now = Instant::now();

        let guard = TimerGuard::arm(&platform, now);
        assert_eq!(loop_platform.take_due(now), Some(guard.handle()));
        drop(guard);
        assert_eq!(loop_platform.active_timers(), 0);
    }
}
