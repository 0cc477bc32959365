// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Deferred tasks driven by an explicit clock.
//!
//! Nothing here reads the system time. Callers pass `now` in, which lets a
//! host drive the scheduler from its event loop and lets tests replay exact
//! timings.

use std::time::{Duration, Instant};

/// Handle to a scheduled task, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    handle: TimerHandle,
    deadline: Instant,
    task: T,
}

/// Deadline-ordered queue of cancellable tasks
#[derive(Debug)]
pub struct Scheduler<T> {
    pending: Vec<Pending<T>>,
    next_handle: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_handle: 1,
        }
    }

    /// Run `task` once `deadline` has passed
    pub fn schedule(&mut self, deadline: Instant, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(Pending {
            handle,
            deadline,
            task,
        });
        handle
    }

    pub fn schedule_after(
        &mut self,
        now: Instant,
        delay: Duration,
        task: T,
    ) -> TimerHandle {
        self.schedule(now + delay, task)
    }

    /// Drop a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Remove and return every task due at `now`, earliest deadline first
    /// and in scheduling order for equal deadlines
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.deadline <= now);
        self.pending = rest;
        due.sort_by_key(|p| (p.deadline, p.handle));
        due.into_iter().map(|p| p.task).collect()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

// ============================================================================
// DEBOUNCER
// ============================================================================

/// Cancel-and-restart timer: only the last trigger in a burst fires
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    handle: Option<TimerHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: None,
        }
    }

    /// (Re)start the quiet period, replacing any pending task
    pub fn trigger<T>(
        &mut self,
        scheduler: &mut Scheduler<T>,
        now: Instant,
        task: T,
    ) -> TimerHandle {
        self.cancel(scheduler);
        let handle = scheduler.schedule_after(now, self.delay, task);
        self.handle = Some(handle);
        handle
    }

    pub fn cancel<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }

    pub fn is_pending<T>(&self, scheduler: &Scheduler<T>) -> bool {
        self.handle
            .map(|handle| scheduler.is_pending(handle))
            .unwrap_or(false)
    }
}

// ============================================================================
// FRAME THROTTLE
// ============================================================================

/// Holds at most one update for the next display frame.
///
/// A new request replaces the pending one, so a burst of pointer moves
/// between two frames results in a single applied update.
#[derive(Debug, Clone)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> FrameThrottle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, update: T) {
        self.pending = Some(update);
    }

    /// Take the update to apply on this frame
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn due_tasks_come_out_in_deadline_order() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(t0, ms(50), "late");
        scheduler.schedule_after(t0, ms(10), "early");
        scheduler.schedule_after(t0, ms(10), "early-second");
        scheduler.schedule_after(t0, ms(500), "pending");

        assert!(scheduler.take_due(t0).is_empty());
        assert_eq!(
            scheduler.take_due(t0 + ms(60)),
            vec!["early", "early-second", "late"]
        );
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(500)));
    }

    #[test]
    fn cancelled_tasks_never_run() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_after(t0, ms(10), 1);
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(scheduler.take_due(t0 + ms(100)).is_empty());
    }

    #[test]
    fn debouncer_keeps_only_the_last_trigger() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut debouncer = Debouncer::new(ms(1000));

        debouncer.trigger(&mut scheduler, t0, 1);
        debouncer.trigger(&mut scheduler, t0 + ms(400), 2);
        debouncer.trigger(&mut scheduler, t0 + ms(800), 3);
        assert_eq!(scheduler.len(), 1);

        assert!(scheduler.take_due(t0 + ms(1500)).is_empty());
        assert!(debouncer.is_pending(&scheduler));
        assert_eq!(scheduler.take_due(t0 + ms(1800)), vec![3]);
        assert!(!debouncer.is_pending(&scheduler));
    }

    #[test]
    fn frame_throttle_keeps_latest_update() {
        let mut throttle = FrameThrottle::new();
        throttle.request(1);
        throttle.request(2);
        throttle.request(3);
        assert_eq!(throttle.take(), Some(3));
        assert_eq!(throttle.take(), None);

        throttle.request(4);
        throttle.cancel();
        assert!(!throttle.is_pending());
    }
}
