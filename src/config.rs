//! Range finder configuration parameters.
//!
//! Values can be overridden at construction time; serde derives keep the
//! struct loadable from whatever provisioning store the host firmware uses.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable parameters for a [`crate::RangeFinder`] instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangerConfig {
    /// Distance-unit scale factor for caller-side conversion.
    /// The driver always returns native (centimetre-equivalent) units;
    /// this factor is stored for the caller's downstream use only.
    pub unit: f64,
    /// Maximum wait for an echo, in seconds.
    pub timeout_secs: f64,
}

impl Default for RangerConfig {
    fn default() -> Self {
        Self {
            unit: 1.0,
            timeout_secs: 1.0,
        }
    }
}

impl RangerConfig {
    /// Reject configurations the measurement loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.unit.is_finite() || self.unit <= 0.0 {
            return Err(Error::Config("unit must be finite and positive"));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(Error::Config("timeout_secs must be finite and positive"));
        }
        Ok(())
    }
}
