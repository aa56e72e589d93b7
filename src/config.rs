//! Controller tuning parameters
//!
//! Every rig-specific constant the decision engine, hysteresis controllers
//! and parameter store rely on. Temperatures and temperature differences are
//! in tenths of a degree Celsius.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Upper bound on chambers a single controller drives.
pub const MAX_CHAMBERS: usize = 4;

/// Core controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlTuning {
    // --- Topology ---
    /// Number of chambers wired to this controller (ids `1..=chamber_count`)
    pub chamber_count: u8,

    // --- Timing ---
    /// Interval between control passes (milliseconds)
    pub control_interval_ms: u32,
    /// Uptime (minutes) during which cooling and heating are vetoed
    pub startup_grace_mins: u8,
    /// Minimum interval between MovingTargets writes (milliseconds)
    pub moving_targets_save_interval_ms: u32,

    // --- Heating ---
    /// Fixed heat output used in HEAT mode (0-100%)
    pub heat_mode_percent: u8,
    /// Heat is vetoed while the cooler toggled within this many minutes
    pub anti_seesaw_margin_mins: u8,

    // --- Ambient & exothermic ---
    /// Batch age (hours) at which fermentation becomes exothermic
    pub exothermic_min_hours: i16,
    /// Batch age (hours) after which fermentation is no longer exothermic
    pub exothermic_max_hours: i16,
    /// Added to the external boost while exothermic
    pub exothermic_bias: i16,
    /// Boost beyond tError above which ambient warming is relied on
    pub ambient_boost_threshold: i16,
    /// Beer-minus-external difference above which ambient cooling is relied on
    pub ambient_cooling_margin: i16,

    // --- Cooling waveform ---
    /// Offset added to a negative error so the cooling sawtooth centres on target
    pub sawtooth_midpoint: i16,
    /// Adjusted error magnitude under which early release is allowed
    pub early_release_error_band: i16,
    /// Chamber must sit this far under target before early release
    pub early_release_chamber_drop: i16,

    // --- PID ---
    /// Integral update is rejected when |Ki * candidate| exceeds this
    pub windup_guard: f32,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            // Topology
            chamber_count: 2,

            // Timing
            control_interval_ms: 60_000, // 1/min
            startup_grace_mins: 2,
            moving_targets_save_interval_ms: 3_600_000, // 1/h

            // Heating
            heat_mode_percent: 75,
            anti_seesaw_margin_mins: 10,

            // Ambient & exothermic
            exothermic_min_hours: 12,
            exothermic_max_hours: 96,
            exothermic_bias: 20,
            ambient_boost_threshold: 10,
            ambient_cooling_margin: 20,

            // Cooling waveform
            sawtooth_midpoint: 3,
            early_release_error_band: 10,
            early_release_chamber_drop: 30,

            // PID
            windup_guard: 50.0,
        }
    }
}

impl ControlTuning {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), Error> {
        if self.chamber_count == 0 || self.chamber_count as usize > MAX_CHAMBERS {
            return Err(Error::InvalidTuning("chamber_count must be 1-4"));
        }
        if !(1_000..=600_000).contains(&self.control_interval_ms) {
            return Err(Error::InvalidTuning(
                "control_interval_ms must be 1000-600000",
            ));
        }
        if self.moving_targets_save_interval_ms < self.control_interval_ms {
            return Err(Error::InvalidTuning(
                "moving_targets_save_interval_ms must be >= control_interval_ms",
            ));
        }
        if self.heat_mode_percent > 100 {
            return Err(Error::InvalidTuning("heat_mode_percent must be 0-100"));
        }
        if self.exothermic_min_hours < 0 || self.exothermic_max_hours < self.exothermic_min_hours
        {
            return Err(Error::InvalidTuning(
                "exothermic window must satisfy 0 <= min <= max",
            ));
        }
        if !(0..=100).contains(&self.exothermic_bias) {
            return Err(Error::InvalidTuning("exothermic_bias must be 0-100"));
        }
        if !(0..=50).contains(&self.sawtooth_midpoint) {
            return Err(Error::InvalidTuning("sawtooth_midpoint must be 0-50"));
        }
        if self.early_release_error_band < 0 || self.early_release_chamber_drop < 0 {
            return Err(Error::InvalidTuning("early release bounds must be >= 0"));
        }
        if self.ambient_boost_threshold < 0 || self.ambient_cooling_margin < 0 {
            return Err(Error::InvalidTuning("ambient margins must be >= 0"));
        }
        if !(self.windup_guard > 0.0 && self.windup_guard <= 100.0) {
            return Err(Error::InvalidTuning("windup_guard must be in (0, 100]"));
        }
        Ok(())
    }

    /// Whether a batch of `age_hours` is in its exothermic phase.
    /// Negative ages mean "not applicable".
    pub fn is_exothermic(&self, age_hours: i16) -> bool {
        age_hours >= 0 && (self.exothermic_min_hours..=self.exothermic_max_hours).contains(&age_hours)
    }
}
