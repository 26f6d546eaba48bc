//! Monotonic time source for the measurement loop.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic)
//!   and `ets_delay_us()` for the trigger settle interval.
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side testing and simulation.

/// Monotonic microsecond clock.
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since clock creation (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since clock creation (monotonic, wraps at `u64::MAX`).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Blocking busy-wait. Only used for the 10 µs trigger settle
    /// interval, which is far below scheduler sleep resolution.
    #[cfg(target_os = "espidf")]
    pub fn delay_us(&self, us: u32) {
        unsafe { esp_idf_svc::sys::ets_delay_us(us) };
    }

    /// Blocking busy-wait. Only used for the 10 µs trigger settle
    /// interval, which is far below scheduler sleep resolution.
    #[cfg(not(target_os = "espidf"))]
    pub fn delay_us(&self, us: u32) {
        let deadline = self.uptime_us().saturating_add(u64::from(us));
        while self.uptime_us() < deadline {
            std::hint::spin_loop();
        }
    }
}
