//! Single-wire ultrasonic range finder driver.
//!
//! Drives Grove-style ultrasonic rangers (single SIG pin shared between
//! trigger and echo) by capturing echo pulse widths and converting them
//! into distances. The pulse-capture hardware is consumed through the
//! [`capture::PulseCapture`] port trait; the crate ships an ESP-IDF RMT
//! backend for real hardware and a scripted simulation backend for
//! host-side tests. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod capture;
pub mod config;
pub mod error;
pub mod ranger;
pub mod time;

#[cfg(target_os = "espidf")]
pub mod rmt;

pub use capture::PulseCapture;
pub use config::RangerConfig;
pub use error::{Error, Result};
pub use ranger::RangeFinder;
