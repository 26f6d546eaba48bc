//! Unified error types for the range finder driver.
//!
//! A single `Error` enum covers construction, configuration, and
//! measurement failures so callers can match once and choose a retry
//! policy per kind. All variants are `Copy` so they can be cheaply
//! returned through the measurement path without allocation.

use core::fmt;

/// Every fallible operation in the driver funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The signal pin could not be claimed for pulse capture.
    /// Fatal to this instance; construct a new one after fixing the wiring.
    HardwareInit(&'static str),
    /// No echo arrived within the configured timeout. Recoverable —
    /// the caller may retry, ideally with backoff on repeated timeouts.
    Timeout,
    /// The sensor reported the overflow sentinel instead of a valid
    /// pulse width. Recoverable — an immediate retry is reasonable.
    NoEcho,
    /// A measurement was attempted after `deinit()` released the pin.
    Released,
    /// Configuration is invalid (non-finite or non-positive values).
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareInit(msg) => write!(f, "hardware init: {msg}"),
            Self::Timeout => write!(f, "no echo within timeout"),
            Self::NoEcho => write!(f, "sensor returned overflow sentinel"),
            Self::Released => write!(f, "range finder already released"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
