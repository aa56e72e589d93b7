//! Controller service, the hexagonal core.
//!
//! [`Controller`] owns the chambers, the parameter store and the uptime
//! clock. All I/O flows through port traits, making the whole controller
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────────┐ ──▶ DiagnosticSink
//!                 │         Controller          │
//! ActuatorPort ◀──│ engine · dwell · pulse · PID│ ◀─▶ StoragePort
//!                 └─────────────────────────────┘
//! ```
//!
//! Two cadences share one cooperative loop, both driven from [`Controller::poll`]:
//! a control pass every `control_interval_ms`, and heater pulse
//! maintenance once per elapsed second.

use log::{debug, error, info, warn};

use crate::actuation::cooler::{self, CoolOutcome};
use crate::actuation::heater;
use crate::chamber::{Chamber, ChamberConfig, ChamberId, ChamberSet, Mode, MovingTargets};
use crate::config::ControlTuning;
use crate::control::engine::{DecisionEngine, Readings};
use crate::error::{Error, SensorError};
use crate::persistence::{ParamStore, SaveOutcome};
use crate::timekeeping::{Uptime, time_up};

use super::commands::{ChamberParams, ControllerCommand, TEMP_LIMIT_MAX, TEMP_LIMIT_MIN};
use super::events::{ChamberSnapshot, DiagnosticEvent, Level, Subsystem};
use super::ports::{ActuatorPort, DiagnosticSink, SensorPort, StoragePort};

/// Longest stall, in seconds, replayed through the heater pulse train.
/// Beyond this the element dwell counters are saturated anyway.
const MAX_SECOND_CATCH_UP: u32 = 300;

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// The controller orchestrates all chambers.
pub struct Controller<S: StoragePort, D: DiagnosticSink> {
    tuning: ControlTuning,
    engine: DecisionEngine,
    chambers: ChamberSet,
    store: ParamStore<S>,
    diag: D,
    clock: Uptime,
    now_ms: u32,
    last_control_ms: u32,
    external_temp: i16,
}

impl<S: StoragePort, D: DiagnosticSink> Controller<S, D> {
    /// Validate `tuning`, build the chambers and overlay every
    /// checksum-valid persisted record onto the defaults.
    pub fn new(tuning: ControlTuning, storage: S, diag: D, now_ms: u32) -> Result<Self, Error> {
        tuning.validate()?;
        let chambers = ChamberSet::new(tuning.chamber_count)?;
        let store = ParamStore::new(
            storage,
            tuning.chamber_count,
            tuning.moving_targets_save_interval_ms,
        )?;

        let mut ctl = Self {
            engine: DecisionEngine::new(&tuning),
            tuning,
            chambers,
            store,
            diag,
            clock: Uptime::new(now_ms),
            now_ms,
            last_control_ms: now_ms,
            external_temp: 0,
        };
        ctl.restore();
        info!(
            "Controller started with {} chamber(s)",
            ctl.chambers.count()
        );
        Ok(ctl)
    }

    /// Overlay persisted records. A record that fails validation keeps its
    /// default; the other record of the same chamber is unaffected.
    fn restore(&mut self) {
        for c in self.chambers.iter_mut() {
            let id = c.id;
            match self.store.load::<ChamberConfig>(id) {
                Ok(cfg) => {
                    c.config = cfg;
                    self.diag.record(
                        &DiagnosticEvent::new(Level::Info, Subsystem::Chamber, 'p').chamber(id),
                    );
                }
                Err(e) => {
                    error!("chamber {id}: stored config rejected ({e}), using defaults");
                    self.diag.record(
                        &DiagnosticEvent::new(Level::Error, Subsystem::Chamber, 'P').chamber(id),
                    );
                }
            }
            match self.store.load::<MovingTargets>(id) {
                Ok(mt) => {
                    c.targets = mt;
                    self.diag.record(
                        &DiagnosticEvent::new(Level::Info, Subsystem::Chamber, 't')
                            .chamber(id)
                            .value(mt.target_temp),
                    );
                }
                Err(e) => {
                    error!("chamber {id}: stored targets rejected ({e}), using defaults");
                    self.diag.record(
                        &DiagnosticEvent::new(Level::Error, Subsystem::Chamber, 'T').chamber(id),
                    );
                }
            }
        }
    }

    // ── Cooperative loop ──────────────────────────────────────

    /// Advance the clock to `now_ms` and run whatever is due: heater pulse
    /// maintenance for each elapsed second, minute counters, and a control
    /// pass once per control interval.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], so one mutable borrow serves both ports.
    pub fn poll(&mut self, now_ms: u32, hw: &mut (impl SensorPort + ActuatorPort)) {
        self.now_ms = now_ms;
        let ticks = self.clock.advance(now_ms);

        for _ in 0..ticks.seconds.min(MAX_SECOND_CATCH_UP) {
            self.second_tick();
            self.maintain_heaters(hw);
        }
        for _ in 0..ticks.minutes.min(u32::from(u8::MAX)) {
            self.minute_tick();
        }

        if time_up(self.last_control_ms, now_ms, self.tuning.control_interval_ms) {
            self.last_control_ms = now_ms;
            self.run_control_pass(hw);
            self.maintain_heaters(hw);
        }
    }

    /// Advance every minute-granularity dwell counter.
    pub fn minute_tick(&mut self) {
        for c in self.chambers.iter_mut() {
            c.state.cooler_last_toggle.tick();
            c.state.heater_last_toggle.tick();
        }
    }

    /// Advance every second-granularity dwell counter.
    pub fn second_tick(&mut self) {
        for c in self.chambers.iter_mut() {
            c.state.heater_element_last_toggle.tick();
        }
    }

    // ── Control pass ──────────────────────────────────────────

    /// Run one full control pass: read sensors → decide → actuate → persist.
    pub fn run_control_pass(&mut self, hw: &mut (impl SensorPort + ActuatorPort)) {
        hw.request_readings();
        let external = sanitize(hw.read_external_temp(), 0, None, 'x', &mut self.diag);
        self.external_temp = external;
        let uptime = self.clock.minutes();

        for c in self.chambers.iter_mut() {
            let id = c.id;
            let target = c.targets.target_temp;
            let readings = Readings {
                beer: sanitize(hw.read_beer_temp(id), target, Some(id), 'b', &mut self.diag),
                chamber: sanitize(hw.read_chamber_temp(id), target, Some(id), 'c', &mut self.diag),
                external,
            };

            let decision = self.engine.decide(c, readings, uptime, &mut self.diag);

            match cooler::apply_request(&mut c.state, &c.config, decision.cooling) {
                CoolOutcome::Switched => {
                    info!(
                        "chamber {id}: cooler {}{}",
                        if c.state.cooler_on { "ON" } else { "OFF" },
                        if decision.cooling.forced { " (forced)" } else { "" }
                    );
                    self.diag.record(
                        &DiagnosticEvent::new(Level::Info, Subsystem::Cooler, 'f')
                            .chamber(id)
                            .value(u8::from(c.state.cooler_on))
                            .value(u8::from(decision.cooling.forced)),
                    );
                }
                CoolOutcome::Held => {
                    self.diag.record(
                        &DiagnosticEvent::new(Level::Debug, Subsystem::Cooler, 'g')
                            .chamber(id)
                            .value(u8::from(decision.cooling.on))
                            .value(c.state.cooler_last_toggle.value()),
                    );
                }
                CoolOutcome::Reaffirmed => {}
            }
            hw.set_cooler(id, c.state.cooler_on);

            heater::set_output(&mut c.state, decision.heat_percent);

            let saved = self
                .store
                .save_moving_targets(id, &c.targets, self.now_ms);
            report_moving_save(saved, c, &mut self.diag);
        }
    }

    /// Re-evaluate every heater element against its heat output.
    pub fn maintain_heaters(&mut self, hw: &mut impl ActuatorPort) {
        for c in self.chambers.iter_mut() {
            if heater::maintain(&mut c.state) {
                debug!(
                    "chamber {}: heater element {} at {}%",
                    c.id,
                    if c.state.heater_element_on { "ON" } else { "OFF" },
                    c.state.heater_output_percent
                );
                hw.set_heater_element(c.id, c.state.heater_element_on);
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (host link, local panel).
    pub fn handle_command(&mut self, cmd: ControllerCommand) -> Result<(), Error> {
        match cmd {
            ControllerCommand::ApplyParams { chamber, params } => self.apply_config(chamber, &params),
            ControllerCommand::SetLocalMode { chamber, mode } => self.set_local_mode(chamber, mode),
        }
    }

    /// Replace a chamber's host-owned parameters.
    ///
    /// ChamberConfig is written immediately when it changed; MovingTargets
    /// goes through the write throttle.
    pub fn apply_config(&mut self, chamber: u8, params: &ChamberParams) -> Result<(), Error> {
        let c = self.chambers.get_mut(chamber)?;
        params.validate()?;
        let id = c.id;

        let previous = c.config;
        c.config = ChamberConfig {
            chamber_id: id.get(),
            mode: params.mode,
            has_heater: params.has_heater,
            cool_min_on_mins: params.cool_min_on_mins,
            cool_min_off_mins: params.cool_min_off_mins,
            cool_switch_on_lag_mins: params.cool_switch_on_lag_mins,
            temp_min: params.temp_min,
            temp_max: params.temp_max,
            kp: params.kp,
            ki: params.ki,
            kd: params.kd,
            checksum: previous.checksum,
        };
        c.targets.target_temp = params.target_temp;
        c.targets.next_target_temp = params.next_target_temp;
        c.targets.batch_age_hours = params.batch_age_hours;

        info!(
            "chamber {id}: params applied (mode {}, target {})",
            params.mode.code(),
            params.target_temp
        );
        self.diag.record(
            &DiagnosticEvent::new(Level::Info, Subsystem::Chamber, '0')
                .chamber(id)
                .value(params.target_temp)
                .value(params.next_target_temp),
        );

        let mut result = Ok(());
        if c.config != previous {
            if let Err(e) = self.store.save(id, &c.config) {
                report_store_failure(e, id, &mut self.diag);
                result = Err(e);
            }
        }
        let saved = self.store.save_moving_targets(id, &c.targets, self.now_ms);
        if let Err(e) = saved {
            result = result.and(Err(e));
        }
        report_moving_save(saved, c, &mut self.diag);
        result
    }

    /// Set or clear the local panel's mode override.
    pub fn set_local_mode(&mut self, chamber: u8, mode: Option<Mode>) -> Result<(), Error> {
        let c = self.chambers.get_mut(chamber)?;
        c.state.local_mode_override = mode;
        match mode {
            Some(m) => info!("chamber {}: local override {}", c.id, m.code()),
            None => info!("chamber {}: local override cleared", c.id),
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Point-in-time view of one chamber.
    pub fn read_snapshot(&self, chamber: u8) -> Result<ChamberSnapshot, Error> {
        let c = self.chambers.get(chamber)?;
        Ok(ChamberSnapshot {
            chamber: c.id.get(),
            config: c.config,
            targets: c.targets,
            effective_mode: c.effective_mode(),
            beer_temp: c.state.beer_temp,
            chamber_temp: c.state.chamber_temp,
            external_temp: self.external_temp,
            heater_output_percent: c.state.heater_output_percent,
            cooler_on: c.state.cooler_on,
            cooler_last_toggle_mins: c.state.cooler_last_toggle.value(),
            heater_last_toggle_mins: c.state.heater_last_toggle.value(),
            beer_trend: c.state.beer_trend,
        })
    }

    pub fn chamber(&self, chamber: u8) -> Result<&Chamber, Error> {
        self.chambers.get(chamber)
    }

    /// Direct access for test rigs and bench tooling.
    pub fn chamber_mut(&mut self, chamber: u8) -> Result<&mut Chamber, Error> {
        self.chambers.get_mut(chamber)
    }

    pub fn chamber_count(&self) -> u8 {
        self.chambers.count()
    }

    pub fn uptime_mins(&self) -> u32 {
        self.clock.minutes()
    }

    pub fn external_temp(&self) -> i16 {
        self.external_temp
    }

    pub fn tuning(&self) -> &ControlTuning {
        &self.tuning
    }

    pub fn store(&self) -> &ParamStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParamStore<S> {
        &mut self.store
    }

    pub fn diagnostics(&self) -> &D {
        &self.diag
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diag
    }
}

// ───────────────────────────────────────────────────────────────
// Helpers
// ───────────────────────────────────────────────────────────────

/// Pass a plausible reading through; otherwise log and substitute
/// `fallback`.
fn sanitize(
    reading: Result<i16, SensorError>,
    fallback: i16,
    chamber: Option<ChamberId>,
    code: char,
    diag: &mut impl DiagnosticSink,
) -> i16 {
    let fault = match reading {
        Ok(t) if (TEMP_LIMIT_MIN..=TEMP_LIMIT_MAX).contains(&t) => return t,
        Ok(_) => SensorError::OutOfRange,
        Err(e) => e,
    };
    warn!("sensor '{code}' fault ({fault}), substituting {fallback}");
    let mut event = DiagnosticEvent::new(Level::Warn, Subsystem::Sensor, code).value(fallback);
    if let Some(id) = chamber {
        event = event.chamber(id);
    }
    diag.record(&event);
    fallback
}

fn report_moving_save(
    saved: Result<SaveOutcome, Error>,
    c: &Chamber,
    diag: &mut impl DiagnosticSink,
) {
    let code = match saved {
        Ok(SaveOutcome::WrittenFirst) => '1',
        Ok(SaveOutcome::Written) => '2',
        Ok(SaveOutcome::Deferred) => return,
        Err(e) => {
            report_store_failure(e, c.id, diag);
            return;
        }
    };
    diag.record(
        &DiagnosticEvent::new(Level::Debug, Subsystem::Chamber, code)
            .chamber(c.id)
            .value(c.targets.integral),
    );
}

fn report_store_failure(e: Error, id: ChamberId, diag: &mut impl DiagnosticSink) {
    error!("chamber {id}: persistence write failed ({e})");
    diag.record(&DiagnosticEvent::new(Level::Error, Subsystem::Store, 'W').chamber(id));
}
