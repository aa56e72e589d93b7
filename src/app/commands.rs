//! Inbound commands to the controller.
//!
//! These represent actions requested by the outside world (host link,
//! local panel) that the [`Controller`](super::service::Controller)
//! interprets and acts upon.

use crate::chamber::Mode;
use crate::error::Error;

/// Plausible temperature range for any host-supplied value, in tenths.
pub const TEMP_LIMIT_MIN: i16 = -550;
pub const TEMP_LIMIT_MAX: i16 = 1250;

/// Full per-chamber parameter set pushed by the host. Replaces the
/// host-owned fields of both persisted records wholesale; the PID integral
/// is controller-owned and survives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChamberParams {
    pub batch_age_hours: i16,
    pub target_temp: i16,
    pub next_target_temp: i16,
    pub temp_min: i16,
    pub temp_max: i16,
    pub has_heater: bool,
    pub cool_min_on_mins: u8,
    pub cool_min_off_mins: u8,
    pub cool_switch_on_lag_mins: u8,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub mode: Mode,
}

impl ChamberParams {
    /// Reject values the controller cannot act on safely.
    pub fn validate(&self) -> Result<(), Error> {
        let plausible = |t: i16| (TEMP_LIMIT_MIN..=TEMP_LIMIT_MAX).contains(&t);
        if !plausible(self.target_temp) || !plausible(self.next_target_temp) {
            return Err(Error::InvalidParams("target out of range"));
        }
        if !plausible(self.temp_min) || !plausible(self.temp_max) {
            return Err(Error::InvalidParams("temperature limit out of range"));
        }
        if self.temp_min >= self.temp_max {
            return Err(Error::InvalidParams("temp_min must be below temp_max"));
        }
        if self.batch_age_hours < -1 {
            return Err(Error::InvalidParams("batch_age_hours must be >= -1"));
        }
        if ![self.kp, self.ki, self.kd]
            .iter()
            .all(|g| g.is_finite() && *g >= 0.0)
        {
            return Err(Error::InvalidParams("PID gains must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Commands that external adapters can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerCommand {
    /// Replace a chamber's host-owned parameters.
    ApplyParams { chamber: u8, params: ChamberParams },

    /// Set or clear the local panel's mode override.
    SetLocalMode { chamber: u8, mode: Option<Mode> },
}
