//! Clock-driven debounce and throttle.
//!
//! Nothing here spawns a timer. Owners call [`Debounced::poll`] or
//! [`Throttle::poll`] from their own loop, and the [`Clock`] decides whether
//! a deadline has passed. Tests swap in a [`ManualClock`] and advance it by
//! hand.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

// === Real implementation ===

/// The monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// === Mock implementation for testing ===

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the component under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Moves time forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + offset
    }
}

/// A value whose changes take effect only after a quiet period.
///
/// Every [`set`](Self::set) replaces the pending value and pushes the
/// deadline out to `now + delay`, so at most one change is ever scheduled.
/// A zero delay applies immediately.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use lexia_table::{Debounced, ManualClock};
///
/// let clock = ManualClock::new();
/// let mut term = Debounced::new(String::new(), Duration::from_millis(300), Arc::new(clock.clone()));
///
/// term.set("an".to_string());
/// clock.advance_ms(299);
/// assert!(!term.poll());
/// assert_eq!(term.applied(), "");
///
/// clock.advance_ms(1);
/// assert!(term.poll());
/// assert_eq!(term.applied(), "an");
/// ```
pub struct Debounced<T> {
    applied: T,
    pending: Option<(T, Instant)>,
    delay: Duration,
    clock: Arc<dyn Clock>,
}

impl<T> Debounced<T> {
    pub fn new(initial: T, delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Debounced {
            applied: initial,
            pending: None,
            delay,
            clock,
        }
    }

    /// Schedules `value`, cancelling whatever was pending.
    pub fn set(&mut self, value: T) {
        if self.delay.is_zero() {
            self.applied = value;
            self.pending = None;
            return;
        }
        let deadline = self.clock.now() + self.delay;
        self.pending = Some((value, deadline));
    }

    /// Applies the pending value if its deadline has passed.
    ///
    /// Returns `true` when the applied value changed.
    pub fn poll(&mut self) -> bool {
        match &self.pending {
            Some((_, deadline)) if self.clock.now() >= *deadline => self.flush(),
            _ => false,
        }
    }

    /// Applies the pending value now.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some((value, _)) => {
                self.applied = value;
                true
            }
            None => false,
        }
    }

    /// Drops the pending value without applying it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Sets the applied value directly and drops anything pending.
    pub fn reset(&mut self, value: T) {
        self.applied = value;
        self.pending = None;
    }

    pub fn applied(&self) -> &T {
        &self.applied
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }

    /// The most recent value: pending if there is one, else applied.
    pub fn latest(&self) -> &T {
        self.pending().unwrap_or(&self.applied)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending value applies.
    pub fn remaining(&self) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, deadline)| deadline.saturating_duration_since(self.clock.now()))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T: fmt::Debug> fmt::Debug for Debounced<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("applied", &self.applied)
            .field("pending", &self.pending())
            .field("delay", &self.delay)
            .finish()
    }
}

/// Rate limiter allowing at most one call per window.
///
/// A call that arrives too early is kept as the trailing call and released
/// by [`poll`](Self::poll) once the window has elapsed; a newer early call
/// replaces it.
pub struct Throttle<T> {
    window: Duration,
    last_fired: Option<Instant>,
    trailing: Option<T>,
    clock: Arc<dyn Clock>,
}

impl<T> Throttle<T> {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Throttle {
            window,
            last_fired: None,
            trailing: None,
            clock,
        }
    }

    /// Claims the window if it is open.
    ///
    /// Returns the time still to wait when it is not.
    pub fn try_fire(&mut self) -> Result<(), Duration> {
        let now = self.clock.now();
        if let Some(last) = self.last_fired {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.window {
                return Err(self.window - elapsed);
            }
        }
        self.last_fired = Some(now);
        Ok(())
    }

    /// Passes `value` through if the window is open, else keeps it as the
    /// trailing call.
    pub fn call(&mut self, value: T) -> Option<T> {
        match self.try_fire() {
            Ok(()) => {
                self.trailing = None;
                Some(value)
            }
            Err(wait) => {
                tracing::trace!(wait_ms = wait.as_millis() as u64, "throttled");
                self.trailing = Some(value);
                None
            }
        }
    }

    /// Releases the trailing call once the window has elapsed.
    pub fn poll(&mut self) -> Option<T> {
        if self.trailing.is_some() && self.try_fire().is_ok() {
            return self.trailing.take();
        }
        None
    }

    /// Forgets the trailing call.
    pub fn cancel(&mut self) {
        self.trailing = None;
    }

    pub fn has_trailing(&self) -> bool {
        self.trailing.is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Throttle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("window", &self.window)
            .field("last_fired", &self.last_fired)
            .field("trailing", &self.trailing)
            .finish()
    }
}
