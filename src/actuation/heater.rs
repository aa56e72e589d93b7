//! Heater time-proportioning.
//!
//! A heat output of P% is realised as a pulse train with a 100-second
//! period: the element is on for P seconds and off for 100 - P. The
//! element's dwell counter advances once per second; [`maintain`] is run
//! once per elapsed second so late callers keep the proportion.
//!
//! ```text
//!   P = 30   ███░░░░░░░███░░░░░░░
//!            |<-30->|<---70--->|
//! ```

use crate::chamber::ChamberState;

/// Pulse period in seconds.
pub const PERIOD_SECS: u8 = 100;

/// Set the heat output percentage, tracking transitions between zero and
/// non-zero output.
pub fn set_output(state: &mut ChamberState, percent: u8) {
    let percent = percent.min(100);
    if (percent > 0) != (state.heater_output_percent > 0) {
        state.heater_last_toggle.reset();
    }
    state.heater_output_percent = percent;
}

/// Re-evaluate the element for the current output. Returns `true` when the
/// element changed state.
pub fn maintain(state: &mut ChamberState) -> bool {
    let pct = state.heater_output_percent.min(100);
    let counter = state.heater_element_last_toggle;

    let want_on = match pct {
        0 => false,
        100 => true,
        _ if state.heater_element_on => !counter.at_least(u16::from(pct)),
        _ => counter.at_least(u16::from(PERIOD_SECS - pct)),
    };

    if want_on == state.heater_element_on {
        return false;
    }
    state.heater_element_on = want_on;
    state.heater_element_last_toggle.reset();
    true
}
