// SPDX-License-Identifier: GPL-3.0-only

//! Delayed message scheduler
//!
//! Replaces fire-and-forget sleep tasks with timers that can be cancelled.
//! Time is virtual: the scheduler only knows the instant it was last moved
//! to, so the same session code runs under a real-time driver and in tests
//! that jump straight to the next deadline.

use std::time::Duration;

/// Handle to one scheduled message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<M> {
    id: TimerId,
    deadline: Duration,
    message: M,
}

/// Single-threaded timer queue
#[derive(Debug)]
pub struct Scheduler<M> {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending<M>>,
}

impl<M> Scheduler<M> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Deliver `message` once `delay` has passed
    pub fn schedule(&mut self, delay: Duration, message: M) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            deadline: self.now + delay,
            message,
        });
        id
    }

    /// Drop a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Drop every pending timer
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline among pending timers
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    /// Move the clock forward; it never runs backwards
    pub fn advance_to(&mut self, instant: Duration) {
        if instant > self.now {
            self.now = instant;
        }
    }

    /// Remove and return the earliest due message
    ///
    /// Timers with equal deadlines fire in scheduling order.
    pub fn pop_due(&mut self) -> Option<(TimerId, M)> {
        let position = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline <= self.now)
            .min_by_key(|(_, p)| (p.deadline, p.id.0))
            .map(|(index, _)| index)?;
        let pending = self.pending.remove(position);
        Some((pending.id, pending.message))
    }
}

impl<M> Default for Scheduler<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_fires_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(MS * 300, "late");
        scheduler.schedule(MS * 100, "early");
        scheduler.schedule(MS * 100, "early-second");

        assert_eq!(scheduler.next_deadline(), Some(MS * 100));
        assert!(scheduler.pop_due().is_none());

        scheduler.advance_to(MS * 1000);
        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_due().map(|(_, m)| m)).collect();
        assert_eq!(order, vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.schedule(MS * 10, 1);
        let b = scheduler.schedule(MS * 10, 2);
        assert!(scheduler.cancel(a));
        assert!(!scheduler.cancel(a));
        assert!(scheduler.is_pending(b));

        scheduler.advance_to(MS * 10);
        assert_eq!(scheduler.pop_due(), Some((b, 2)));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_delay_is_relative_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(MS * 500);
        scheduler.advance_to(MS * 100);
        assert_eq!(scheduler.now(), MS * 500);
        scheduler.schedule(MS * 100, ());
        assert_eq!(scheduler.next_deadline(), Some(MS * 600));
        assert_eq!(scheduler.cancel_all(), 1);
        assert_eq!(scheduler.next_deadline(), None);
    }
}
