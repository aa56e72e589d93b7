//! Compressor dwell guard.
//!
//! A compressor must not short-cycle: once switched on it runs at least
//! `cool_min_on_mins + cool_switch_on_lag_mins`, once switched off it rests
//! at least `cool_min_off_mins`. Normal requests that arrive too early are
//! held; forced requests (safety vetoes) always take effect.

use crate::chamber::{ChamberConfig, ChamberState};

/// Cooling request produced by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoolRequest {
    pub on: bool,
    /// Bypass the dwell guard.
    pub forced: bool,
}

impl CoolRequest {
    pub const ON: Self = Self {
        on: true,
        forced: false,
    };
    pub const OFF: Self = Self {
        on: false,
        forced: false,
    };
    pub const FORCED_OFF: Self = Self {
        on: false,
        forced: true,
    };
}

/// What the dwell guard did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoolOutcome {
    /// Cooler changed state; dwell counter reset.
    Switched,
    /// Request matched the current state.
    Reaffirmed,
    /// Normal request denied until the dwell time has elapsed.
    Held,
}

/// Apply `req` to the chamber's cooler state.
///
/// The caller drives the physical output from `state.cooler_on` afterwards,
/// whatever the outcome.
pub fn apply_request(
    state: &mut ChamberState,
    config: &ChamberConfig,
    req: CoolRequest,
) -> CoolOutcome {
    if req.on == state.cooler_on {
        return CoolOutcome::Reaffirmed;
    }

    let allowed = req.forced
        || if req.on {
            state
                .cooler_last_toggle
                .at_least(u16::from(config.cool_min_off_mins))
        } else {
            state.cooler_last_toggle.at_least(config.cool_min_run_mins())
        };

    if !allowed {
        return CoolOutcome::Held;
    }

    state.cooler_on = req.on;
    state.cooler_last_toggle.reset();
    CoolOutcome::Switched
}
