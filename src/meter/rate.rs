//! Decaying rate meter implementation.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::clock::{Clock, MonotonicClock};
use super::decay::DecayKind;
use super::Meter;
use crate::error::{MeterError, Result};

/// State guarded by the meter's lock.
#[derive(Debug)]
struct DecayState {
    /// Decayed estimate of the events seen within the last window
    rate: f64,
    /// Clock reading at which decay was last applied
    last_decay: u64,
}

/// A thread-safe meter that tracks a lifetime event count and a decaying
/// estimate of recent event volume.
///
/// The rate is kept as a single scalar that is lazily decayed on every
/// [`mark`](RateMeter::mark) and [`rate`](RateMeter::rate), so memory and
/// per-call cost stay constant no matter how many events are recorded.
/// Once more than one full window passes without a call, the rate drops to
/// exactly zero.
///
/// The lifetime count lives in an atomic and can be read without taking the
/// decay lock.
#[derive(Debug)]
pub struct RateMeter<C: Clock = MonotonicClock> {
    /// Lifetime sum of marked deltas, never below zero
    count: AtomicI64,
    state: Mutex<DecayState>,
    /// Window length in nanoseconds, always > 0
    window: u64,
    kind: DecayKind,
    clock: C,
}

impl RateMeter<MonotonicClock> {
    /// Create a meter over `window` using the given decay shape.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero. Use [`RateMeter::try_new`] to get an
    /// error instead.
    pub fn new(window: Duration, kind: DecayKind) -> Self {
        Self::with_clock(window, kind, MonotonicClock::new())
    }

    /// Create a meter, rejecting a zero window.
    pub fn try_new(window: Duration, kind: DecayKind) -> Result<Self> {
        Self::try_with_clock(window, kind, MonotonicClock::new())
    }

    /// Create a meter whose rate fades linearly to zero over `window`.
    pub fn linear(window: Duration) -> Self {
        Self::new(window, DecayKind::Linear)
    }

    /// Create a meter whose rate decays exponentially with `window` as the
    /// mean lifetime.
    pub fn mean_lifetime(window: Duration) -> Self {
        Self::new(window, DecayKind::MeanLifetime)
    }

    /// Create a meter whose rate halves every `window`.
    pub fn half_life(window: Duration) -> Self {
        Self::new(window, DecayKind::HalfLife)
    }
}

impl<C: Clock> RateMeter<C> {
    /// Create a meter reading time from `clock`.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero.
    pub fn with_clock(window: Duration, kind: DecayKind, clock: C) -> Self {
        assert!(!window.is_zero(), "decay window must be greater than zero");
        Self::build(window, kind, clock)
    }

    /// Create a meter reading time from `clock`, rejecting a zero window.
    pub fn try_with_clock(window: Duration, kind: DecayKind, clock: C) -> Result<Self> {
        if window.is_zero() {
            return Err(MeterError::InvalidWindow);
        }
        Ok(Self::build(window, kind, clock))
    }

    fn build(window: Duration, kind: DecayKind, clock: C) -> Self {
        let window = u64::try_from(window.as_nanos()).unwrap_or(u64::MAX);
        debug!(window_ns = window, decay = %kind, "Creating rate meter");

        let last_decay = clock.now_nanos();
        Self {
            count: AtomicI64::new(0),
            state: Mutex::new(DecayState {
                rate: 0.0,
                last_decay,
            }),
            window,
            kind,
            clock,
        }
    }

    /// Record `delta` events.
    ///
    /// The rate is first decayed up to now, then `delta` is added to both the
    /// rate and the lifetime count. Negative deltas are accepted but neither
    /// value is allowed to drop below zero.
    pub fn mark(&self, delta: i64) {
        let mut state = self.state.lock();
        self.decay(&mut state);

        // Writers hold the state lock, so load-then-store cannot race.
        let count = self
            .count
            .load(Ordering::SeqCst)
            .saturating_add(delta)
            .max(0);
        self.count.store(count, Ordering::SeqCst);

        state.rate = (state.rate + delta as f64).max(0.0);
    }

    /// Decay the rate up to now and return it.
    ///
    /// This is not a pure read: it re-bases the decay timestamp, so two calls
    /// in a row only agree when no measurable time passed between them.
    pub fn rate(&self) -> f64 {
        let mut state = self.state.lock();
        self.decay(&mut state);
        state.rate
    }

    /// Lifetime sum of all marked deltas. Never decays.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::SeqCst)
    }

    /// The decay window.
    pub fn window(&self) -> Duration {
        Duration::from_nanos(self.window)
    }

    /// The decay shape chosen at construction.
    pub fn decay_kind(&self) -> DecayKind {
        self.kind
    }

    /// Decay the rate and capture it together with the count.
    pub fn snapshot(&self) -> MeterSnapshot {
        let mut state = self.state.lock();
        self.decay(&mut state);
        MeterSnapshot {
            count: self.count.load(Ordering::SeqCst),
            rate: state.rate,
            window_ns: self.window,
            decay: self.kind,
        }
    }

    /// Bring `state.rate` up to the current clock reading.
    fn decay(&self, state: &mut DecayState) {
        let now = self.clock.now_nanos();
        let elapsed = now.saturating_sub(state.last_decay);

        if elapsed > self.window {
            if state.rate > 0.0 {
                trace!(
                    elapsed_ns = elapsed,
                    window_ns = self.window,
                    "Window elapsed, rate reset to zero"
                );
            }
            state.rate = 0.0;
        } else if elapsed > 0 {
            let fraction = elapsed as f64 / self.window as f64;
            state.rate *= self.kind.multiplier(fraction);
        }

        state.last_decay = state.last_decay.max(now);
    }
}

impl<C: Clock> Meter for RateMeter<C> {
    fn mark(&self, delta: i64) {
        RateMeter::mark(self, delta)
    }

    fn rate(&self) -> f64 {
        RateMeter::rate(self)
    }

    fn count(&self) -> i64 {
        RateMeter::count(self)
    }
}

/// Point-in-time view of a meter, suitable for exporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterSnapshot {
    /// Lifetime event count
    pub count: i64,
    /// Decayed rate at the time of the snapshot
    pub rate: f64,
    /// Window length in nanoseconds
    pub window_ns: u64,
    /// Decay shape of the meter
    pub decay: DecayKind,
}
