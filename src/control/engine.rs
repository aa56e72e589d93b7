//! Per-chamber decision engine.
//!
//! One call to [`DecisionEngine::decide`] per chamber per control pass:
//!
//! ```text
//!  readings ─▶ tError ─▶ mode arbitration ─▶ PID ─▶ trend ─▶ vetoes ─▶ Decision
//!                              │                                 │
//!                    cooling request                  anti-seesaw · heat · cool
//! ```
//!
//! The engine only decides; it never touches actuators. The dwell guard and
//! heater pulse train turn a [`Decision`] into relay changes.

use core::cmp::Ordering;

use log::debug;

use crate::actuation::cooler::CoolRequest;
use crate::app::events::{DiagnosticEvent, Level, Subsystem};
use crate::app::ports::DiagnosticSink;
use crate::chamber::{Chamber, Mode};
use crate::config::ControlTuning;

use super::pid::{PidOutput, PidTracker, track_trend};

/// Temperatures used for one pass, in tenths. Faulty channels have
/// already been substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readings {
    pub beer: i16,
    pub chamber: i16,
    pub external: i16,
}

/// Output of one pass for one chamber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub cooling: CoolRequest,
    pub heat_percent: u8,
    /// PID output when heat was PID-driven this pass.
    pub pid: Option<PidOutput>,
}

/// Heat/cool arbitration before vetoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Arbitration {
    cooling: CoolRequest,
    heat: HeatSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeatSource {
    None,
    Fixed(u8),
    Pid,
}

pub struct DecisionEngine {
    tuning: ControlTuning,
    pid: PidTracker,
}

impl DecisionEngine {
    pub fn new(tuning: &ControlTuning) -> Self {
        Self {
            tuning: *tuning,
            pid: PidTracker::new(tuning.windup_guard),
        }
    }

    /// Run one control pass for `chamber`.
    ///
    /// Updates the chamber's readings, PID memory and trend. Cooler and
    /// heater state are left for the hysteresis controllers.
    pub fn decide(
        &self,
        chamber: &mut Chamber,
        readings: Readings,
        uptime_mins: u32,
        diag: &mut impl DiagnosticSink,
    ) -> Decision {
        let id = chamber.id;
        chamber.state.beer_temp = readings.beer;
        chamber.state.chamber_temp = readings.chamber;

        let mode = chamber.effective_mode();
        let t_error = chamber.targets.target_temp.saturating_sub(readings.beer);

        // PID memory is maintained in every mode so a switch into AUTO
        // starts from a settled integral.
        if !self
            .pid
            .accumulate(&mut chamber.targets, chamber.config.ki, t_error)
        {
            diag.record(
                &DiagnosticEvent::new(Level::Debug, Subsystem::Pid, 'w')
                    .chamber(id)
                    .value(t_error)
                    .value(chamber.targets.integral),
            );
        }
        diag.record(
            &DiagnosticEvent::new(Level::Debug, Subsystem::Pid, '~')
                .chamber(id)
                .value(t_error)
                .value(chamber.targets.integral)
                .value(chamber.state.prior_error),
        );

        let arb = self.arbitrate(chamber, mode, t_error, readings);

        let mut pid_out = None;
        let mut heat = match arb.heat {
            HeatSource::None => 0,
            HeatSource::Fixed(pct) => pct,
            HeatSource::Pid => {
                let out = self.pid.compute(
                    &chamber.config,
                    chamber.targets.integral,
                    t_error,
                    chamber.state.prior_error,
                );
                self.report_pid(chamber, out, diag);
                pid_out = Some(out);
                out.percent()
            }
        };

        if track_trend(&mut chamber.state, t_error) {
            diag.record(
                &DiagnosticEvent::new(Level::Debug, Subsystem::Pid, 'd')
                    .chamber(id)
                    .value(chamber.state.beer_trend),
            );
        }

        // ── Vetoes ─────────────────────────────────────────────

        let just_started = uptime_mins < u32::from(self.tuning.startup_grace_mins);

        if heat > 0 && mode.arbitrates() && self.cooler_recently_active(chamber) {
            debug!("chamber {id}: anti-seesaw cancels {heat}% heat");
            diag.record(
                &DiagnosticEvent::new(Level::Debug, Subsystem::Heater, 's')
                    .chamber(id)
                    .value(heat)
                    .value(chamber.state.cooler_last_toggle.value()),
            );
            heat = 0;
        }

        if matches!(mode, Mode::MonitorOnly | Mode::DisableHeater)
            || just_started
            || !chamber.config.has_heater
        {
            heat = 0;
        }

        let cooling = if matches!(mode, Mode::MonitorOnly | Mode::DisableFridge)
            || just_started
            || heat > 0
        {
            CoolRequest::FORCED_OFF
        } else {
            arb.cooling
        };

        Decision {
            cooling,
            heat_percent: heat,
            pid: pid_out,
        }
    }

    fn arbitrate(&self, c: &Chamber, mode: Mode, t_error: i16, r: Readings) -> Arbitration {
        match mode {
            Mode::MonitorOnly => Arbitration {
                cooling: CoolRequest::OFF,
                heat: HeatSource::None,
            },
            Mode::Heat => Arbitration {
                cooling: CoolRequest::FORCED_OFF,
                heat: if r.beer < c.config.temp_max {
                    HeatSource::Fixed(self.tuning.heat_mode_percent)
                } else {
                    HeatSource::None
                },
            },
            Mode::Cool => Arbitration {
                cooling: if r.beer > c.config.temp_min {
                    CoolRequest::ON
                } else {
                    CoolRequest::OFF
                },
                heat: HeatSource::None,
            },
            Mode::Auto | Mode::Hold | Mode::DisableHeater | Mode::DisableFridge => {
                self.arbitrate_auto(c, t_error, r)
            }
        }
    }

    fn arbitrate_auto(&self, c: &Chamber, t_error: i16, r: Readings) -> Arbitration {
        let t = &self.tuning;
        let target = c.targets.target_temp;
        let next = c.targets.next_target_temp;
        let exothermic = t.is_exothermic(c.targets.batch_age_hours);

        match t_error.cmp(&0) {
            Ordering::Equal => {
                // Spot on. Ride on with the cooler only while the beer is
                // warming in a warm room and the profile is not about to rise.
                let keep = c.state.cooler_on
                    && r.external > target
                    && c.state.beer_trend > 0
                    && next <= target;
                Arbitration {
                    cooling: if keep { CoolRequest::ON } else { CoolRequest::OFF },
                    heat: HeatSource::None,
                }
            }
            Ordering::Greater => {
                // Beer too cool.
                let mut boost = r.external.saturating_sub(r.beer);
                if exothermic {
                    boost = boost.saturating_add(t.exothermic_bias);
                }
                let heat = if boost.saturating_sub(t_error) > t.ambient_boost_threshold {
                    HeatSource::None
                } else {
                    HeatSource::Pid
                };
                Arbitration {
                    cooling: CoolRequest::OFF,
                    heat,
                }
            }
            Ordering::Less => {
                // Beer too warm.
                let adjusted = t_error.saturating_add(t.sawtooth_midpoint);
                if adjusted >= 0 {
                    return Arbitration {
                        cooling: CoolRequest::OFF,
                        heat: HeatSource::None,
                    };
                }
                let early_release = c.state.cooler_on
                    && adjusted > -t.early_release_error_band
                    && r.chamber <= target.saturating_sub(t.early_release_chamber_drop);
                let ambient_favourable =
                    r.beer.saturating_sub(r.external) > t.ambient_cooling_margin;
                let cool = !early_release && (!ambient_favourable || exothermic || next < target);
                Arbitration {
                    cooling: if cool { CoolRequest::ON } else { CoolRequest::OFF },
                    heat: HeatSource::None,
                }
            }
        }
    }

    /// Cooler running, or switched within the anti-seesaw margin.
    fn cooler_recently_active(&self, c: &Chamber) -> bool {
        c.state.cooler_on
            || !c
                .state
                .cooler_last_toggle
                .at_least(u16::from(self.tuning.anti_seesaw_margin_mins))
    }

    fn report_pid(&self, c: &Chamber, out: PidOutput, diag: &mut impl DiagnosticSink) {
        // Clamping only matters when there is a heater to drive.
        let level = if out.is_anomalous() && c.config.has_heater {
            Level::Warn
        } else {
            Level::Debug
        };
        let event = match out {
            PidOutput::BelowZero(raw) => DiagnosticEvent::new(level, Subsystem::Pid, '-').value(raw),
            PidOutput::AboveFull(raw) => DiagnosticEvent::new(level, Subsystem::Pid, '+').value(raw),
            PidOutput::InRange(pct) => DiagnosticEvent::new(level, Subsystem::Pid, '=').value(pct),
        };
        diag.record(&event.chamber(c.id));
    }
}
