//! Delayed-action scheduling on a simulated millisecond clock
//!
//! The scheduler knows nothing about the game. It stores opaque actions with
//! a due time and hands them back, in order, once the clock passes them.

use std::collections::BTreeMap;

/// Identifies one scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Delay-scheduling primitive consumed by the round controller
pub trait Scheduler<A> {
    /// Queue `action` to fire `delay_ms` after the current clock time
    fn schedule(&mut self, delay_ms: u64, action: A) -> TimerHandle;

    /// Drop every pending action. Nothing scheduled before this call fires afterwards.
    fn cancel_all(&mut self);

    /// Move the clock forward and return the actions that became due, oldest first
    fn advance(&mut self, dt_ms: u64) -> Vec<A>;

    /// Number of actions still waiting to fire
    fn pending_len(&self) -> usize;
}

/// Deterministic scheduler driven by explicit `advance` calls
///
/// Entries are keyed by `(due_ms, handle)` so actions due at the same instant
/// fire in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    now_ms: u64,
    next_handle: u64,
    pending: BTreeMap<(u64, TimerHandle), A>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_handle: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Current simulated time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Absolute time of the earliest pending action
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(due, _)| due)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<A> Scheduler<A> for TimerQueue<A> {
    fn schedule(&mut self, delay_ms: u64, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let due = self.now_ms.saturating_add(delay_ms);
        self.pending.insert((due, handle), action);
        handle
    }

    fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelling {} pending timers", self.pending.len());
        }
        self.pending.clear();
    }

    fn advance(&mut self, dt_ms: u64) -> Vec<A> {
        self.now_ms = self.now_ms.saturating_add(dt_ms);

        // Everything keyed after (now, MAX) is still in the future
        let later = self
            .pending
            .split_off(&(self.now_ms.saturating_add(1), TimerHandle(0)));
        let due = std::mem::replace(&mut self.pending, later);
        due.into_values().collect()
    }

    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
