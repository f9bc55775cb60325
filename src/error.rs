//! Error types for decaymeter.

use thiserror::Error;

/// Main error type for decaymeter operations.
///
/// A live meter never fails; these errors only come out of construction,
/// configuration loading and registry bookkeeping.
#[derive(Error, Debug)]
pub enum MeterError {
    /// The decay window must be a positive duration
    #[error("Invalid window: decay window must be greater than zero")]
    InvalidWindow,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A meter with this name is already registered
    #[error("Meter already registered: {0}")]
    DuplicateMeter(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for decaymeter operations.
pub type Result<T> = std::result::Result<T, MeterError>;
