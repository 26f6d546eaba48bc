//! Fuzz target: `RangeFinder::distance`
//!
//! Interprets arbitrary bytes as scripted capture cycles and drives
//! measurements through them, asserting that every outcome is a typed
//! result — no panics, no negative distances, and the overflow sentinel
//! never escapes as a numeric value.
//!
//! cargo fuzz run fuzz_distance

#![no_main]

use libfuzzer_sys::fuzz_target;
use sonar_ranger::capture::{NO_ECHO_SENTINEL, SimPulseCapture};
use sonar_ranger::{Error, RangeFinder, RangerConfig};

fuzz_target!(|data: &[u8]| {
    let mut sim = SimPulseCapture::new();

    // Each pair of bytes is one captured duration; every 8 durations
    // start a new scripted cycle.
    let durations: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let cycles: Vec<&[u16]> = durations.chunks(8).collect();
    for cycle in &cycles {
        sim.script_echo(cycle);
    }

    // Millisecond timeout keeps unscripted cycles from stalling the run.
    let cfg = RangerConfig {
        unit: 1.0,
        timeout_secs: 0.001,
    };
    let mut ranger = match RangeFinder::new(sim, cfg) {
        Ok(r) => r,
        Err(_) => return,
    };

    for cycle in &cycles {
        match ranger.distance() {
            Ok(d) => {
                assert!(d.is_finite() && d >= 0.0, "non-physical distance {d}");
                assert_ne!(
                    cycle.first(),
                    Some(&NO_ECHO_SENTINEL),
                    "sentinel escaped as a numeric distance"
                );
            }
            Err(Error::Timeout | Error::NoEcho) => {}
            Err(e) => panic!("unexpected error kind: {e:?}"),
        }
    }

    ranger.deinit();
    ranger.deinit();
});
