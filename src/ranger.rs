//! Ultrasonic range finder measurement state machine.
//!
//! ## Hardware
//!
//! Grove-style rangers share trigger and echo on a single SIG pin. The
//! sensor recognises a new measurement request when the line sits idle
//! for a short interval, then answers with one echo pulse whose width
//! encodes the round-trip time of flight.
//!
//! ## Measurement cycle
//!
//! Each `distance()` call is one *idle → capturing → idle* cycle: clear
//! stale readings, let the line settle, arm the capture, busy-poll for
//! the first reading against the timeout, and convert the pulse width
//! to centimetres. Calls are not reentrant — they share the single
//! capture buffer — and must be serialised by the caller.

use log::{debug, warn};

use crate::capture::{NO_ECHO_SENTINEL, PulseCapture};
use crate::config::RangerConfig;
use crate::error::{Error, Result};
use crate::time::MonotonicClock;

/// Idle settle interval before re-arming capture (µs). On single-wire
/// sensors this brief idle period stands in for an explicit trigger pulse.
const SETTLE_US: u32 = 10;

/// Capture auto-stop bound. A normal cycle produces far fewer edges;
/// this caps buffer growth if the line is noisy.
const MAX_EDGES: u16 = 20;

/// Round-trip microseconds of sound per centimetre of range
/// (343.2 m/s in dry air at 20 °C).
const US_PER_CM_ROUND_TRIP: f64 = 29.1;

/// Blocking driver for a single-wire ultrasonic ranger.
///
/// Owns its [`PulseCapture`] exclusively. The pin is released exactly
/// once, on [`deinit`](Self::deinit) or on drop, whichever comes first.
pub struct RangeFinder<C: PulseCapture> {
    /// `None` once the pin has been released.
    capture: Option<C>,
    config: RangerConfig,
    clock: MonotonicClock,
}

impl<C: PulseCapture> RangeFinder<C> {
    /// Bind to a pulse capture and leave it paused with an empty buffer.
    ///
    /// Pin-claim failures (`Error::HardwareInit`) surface from the
    /// capture implementation's own constructor before this is reached.
    pub fn new(mut capture: C, config: RangerConfig) -> Result<Self> {
        config.validate()?;
        capture.pause();
        capture.clear();
        Ok(Self {
            capture: Some(capture),
            config,
            clock: MonotonicClock::new(),
        })
    }

    /// Bind with `unit = 1.0` and a 1 s echo timeout.
    pub fn with_defaults(capture: C) -> Result<Self> {
        Self::new(capture, RangerConfig::default())
    }

    /// Run one measurement cycle and return the distance in native
    /// (centimetre-equivalent) units.
    ///
    /// Blocks the calling thread for up to `timeout_secs`. The poll loop
    /// is a deliberate tight spin: a valid echo arrives within
    /// milliseconds, and yielding would cost more than it saves.
    pub fn distance(&mut self) -> Result<f64> {
        let timeout_us = (self.config.timeout_secs * 1_000_000.0) as u64;
        let capture = self.capture.as_mut().ok_or(Error::Released)?;

        // Discard readings left over from any prior cycle, then hold the
        // line idle so the sensor accepts a new measurement request.
        capture.clear();
        self.clock.delay_us(SETTLE_US);

        let start = self.clock.uptime_us();
        capture.resume(MAX_EDGES);

        while capture.len() == 0 {
            if self.clock.uptime_us().wrapping_sub(start) > timeout_us {
                capture.pause();
                warn!(
                    "ranger: no echo within {:.3}s",
                    self.config.timeout_secs
                );
                return Err(Error::Timeout);
            }
        }

        // First reading is in; stop accepting further edges.
        capture.pause();

        let duration = capture.get(0).ok_or(Error::NoEcho)?;
        if duration == NO_ECHO_SENTINEL {
            debug!("ranger: capture reported overflow sentinel");
            return Err(Error::NoEcho);
        }

        let cm = f64::from(duration) / 2.0 / US_PER_CM_ROUND_TRIP;
        debug!("ranger: echo {duration}us -> {cm:.1}cm");
        Ok(cm)
    }

    /// Distance-unit scale factor, stored for caller-side conversion.
    /// Never applied to the value returned by [`distance`](Self::distance).
    pub fn unit(&self) -> f64 {
        self.config.unit
    }

    /// Maximum wait for an echo, in seconds.
    pub fn timeout_secs(&self) -> f64 {
        self.config.timeout_secs
    }

    /// True once the signal pin has been released.
    pub fn is_released(&self) -> bool {
        self.capture.is_none()
    }

    /// Shared access to the underlying capture, if not yet released.
    pub fn capture(&self) -> Option<&C> {
        self.capture.as_ref()
    }

    /// Release the signal pin.
    ///
    /// The first call pauses the capture and deinitialises the pin;
    /// later calls are no-ops. `distance()` after release returns
    /// [`Error::Released`].
    pub fn deinit(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.pause();
            capture.deinit();
            debug!("ranger: signal pin released");
        }
    }
}

impl<C: PulseCapture> Drop for RangeFinder<C> {
    /// Scoped-acquisition guarantee: the pin is never left half-captured,
    /// whatever exit path dropped the finder.
    fn drop(&mut self) {
        self.deinit();
    }
}
