//! Decaymeter - Decaying Event Rate Meters
//!
//! This crate provides a thread-safe meter that keeps an exact lifetime
//! event count alongside an estimate of recent event volume. The estimate
//! fades with a configurable decay shape instead of dropping events off a
//! hard window edge, and it needs no per-event storage.
//!
//! ```
//! use std::time::Duration;
//! use decaymeter::RateMeter;
//!
//! let requests = RateMeter::half_life(Duration::from_secs(1));
//! requests.mark(1);
//! assert_eq!(requests.count(), 1);
//! assert!(requests.rate() <= 1.0);
//! ```

pub mod config;
pub mod error;
pub mod meter;

pub use error::{MeterError, Result};
pub use meter::{
    Clock, DecayKind, ManualClock, Meter, MeterRegistry, MeterSnapshot, MonotonicClock, RateMeter,
};
