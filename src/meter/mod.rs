//! Rate meters and the pieces they are built from.

mod clock;
mod decay;
mod rate;
mod registry;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use decay::DecayKind;
pub use rate::{MeterSnapshot, RateMeter};
pub use registry::MeterRegistry;

/// Trait for event meters.
///
/// This allows instrumented code to hold any meter behind an
/// `Arc<dyn Meter>` regardless of the clock it reads.
pub trait Meter: Send + Sync {
    /// Record `delta` events.
    fn mark(&self, delta: i64);

    /// Current decayed rate. May update internal decay state.
    fn rate(&self) -> f64;

    /// Lifetime count of recorded events.
    fn count(&self) -> i64;
}
