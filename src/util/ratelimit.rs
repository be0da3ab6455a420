//! Debounce and throttle primitives.
//!
//! Both are driven by `tokio::time::Instant`, so they follow the paused
//! clock in tests and can be polled from a UI tick without spawning timers.

use std::time::Duration;
use tokio::time::Instant;

/// Holds a settled value that only follows its input once the input has
/// stopped changing for `delay`.
///
/// Every [`push`](Debouncer::push) of a new value supersedes (cancels) the
/// pending one and restarts the wait. Pushing the value that is already
/// pending does not restart it.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    settled: T,
    pending: Option<(T, Instant)>,
    delay: Duration,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            settled: initial,
            pending: None,
            delay,
        }
    }

    /// Feed a new input value.
    pub fn push(&mut self, value: T) {
        let unchanged = match &self.pending {
            Some((pending, _)) => *pending == value,
            None => self.settled == value,
        };
        if !unchanged {
            self.pending = Some((value, Instant::now()));
        }
    }

    /// Promote the pending value if it has been stable for the full delay.
    ///
    /// Returns the newly settled value exactly once per settlement.
    pub fn poll(&mut self) -> Option<&T> {
        let ready = matches!(&self.pending, Some((_, since)) if since.elapsed() >= self.delay);
        if !ready {
            return None;
        }
        let (value, _) = self.pending.take()?;
        self.settled = value;
        Some(&self.settled)
    }

    /// The last settled value.
    pub fn value(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending value and settle on `value` immediately.
    pub fn reset(&mut self, value: T) {
        self.pending = None;
        self.settled = value;
    }
}

/// Forwards at most one call per `interval`, dropping calls that arrive
/// before the interval since the last forwarded call has elapsed.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_invoked: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_invoked: None,
        }
    }

    /// Claim the current slot. Returns false when the call must be dropped.
    pub fn try_acquire(&mut self) -> bool {
        let now = Instant::now();
        match self.last_invoked {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_invoked = Some(now);
                true
            }
        }
    }

    /// Run `f` if the throttle allows it.
    pub fn call<R>(&mut self, f: impl FnOnce() -> R) -> Option<R> {
        if self.try_acquire() {
            Some(f())
        } else {
            None
        }
    }
}
