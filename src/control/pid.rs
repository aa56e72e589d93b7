//! PID & trend tracker for heat output
//!
//! Error is `target - beer` in tenths of a degree, sampled once per control
//! pass, so the integral is a plain running sum and the derivative a plain
//! difference. The integral lives in [`MovingTargets`] so it survives power
//! loss; it is only advanced while the integral term stays inside the
//! windup guard.

use crate::chamber::{ChamberConfig, ChamberState, MovingTargets};

/// Raw PID output before it becomes a heat percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PidOutput {
    /// Negative (or NaN) output, clamped to 0%.
    BelowZero(f32),
    /// Output above 100, clamped to 100%.
    AboveFull(f32),
    /// Rounded output in range.
    InRange(u8),
}

impl PidOutput {
    pub fn percent(self) -> u8 {
        match self {
            Self::BelowZero(_) => 0,
            Self::AboveFull(_) => 100,
            Self::InRange(p) => p,
        }
    }

    /// Whether clamping was needed.
    pub fn is_anomalous(self) -> bool {
        !matches!(self, Self::InRange(_))
    }
}

/// Per-pass PID bookkeeping
pub struct PidTracker {
    windup_guard: f32,
}

impl PidTracker {
    pub fn new(windup_guard: f32) -> Self {
        Self { windup_guard }
    }

    /// Advance the integral by `t_error` unless the resulting integral term
    /// would leave the windup guard. Returns `false` when rejected.
    pub fn accumulate(&self, targets: &mut MovingTargets, ki: f32, t_error: i16) -> bool {
        let candidate = targets.integral + f32::from(t_error);
        if (ki * candidate).abs() > self.windup_guard {
            return false;
        }
        targets.integral = candidate;
        true
    }

    /// Heat output from the current error, integral and last error.
    pub fn compute(
        &self,
        config: &ChamberConfig,
        integral: f32,
        t_error: i16,
        prior_error: i16,
    ) -> PidOutput {
        let err = f32::from(t_error);
        let delta = f32::from(t_error) - f32::from(prior_error);
        let raw = config.kp * err + config.ki * integral + config.kd * delta;

        if raw.is_nan() || raw < 0.0 {
            PidOutput::BelowZero(raw)
        } else if raw > 100.0 {
            PidOutput::AboveFull(raw)
        } else {
            PidOutput::InRange(raw.round() as u8)
        }
    }
}

/// Update the beer trend from the change in error, then remember the error.
///
/// A falling error (beer warming towards target) gives a positive trend.
/// With no change the trend decays one step towards zero. Returns `true`
/// when the trend decayed.
pub fn track_trend(state: &mut ChamberState, t_error: i16) -> bool {
    let change = state.prior_error.saturating_sub(t_error);
    let decayed = if change != 0 {
        state.beer_trend = change.saturating_mul(10);
        false
    } else {
        let before = state.beer_trend;
        state.beer_trend -= state.beer_trend.signum();
        before != state.beer_trend
    };
    state.prior_error = t_error;
    decayed
}
