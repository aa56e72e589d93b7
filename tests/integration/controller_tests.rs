//! Integration tests for the Controller service.
//!
//! Each test drives the controller through its public API with mock
//! probes, relays, EEPROM and diagnostic sink. Temperatures are tenths.

use chamberctl::Controller;
use chamberctl::app::commands::{ChamberParams, ControllerCommand};
use chamberctl::app::events::{Level, Subsystem};
use chamberctl::app::ports::StorageError;
use chamberctl::chamber::{DwellCounter, Mode, MovingTargets};
use chamberctl::config::ControlTuning;
use chamberctl::error::{Error, SensorError};
use chamberctl::persistence::Record;

use crate::mock_hw::{ActuatorCall, CountingEeprom, MockHardware, RecordingSink};

const EEPROM_BYTES: usize = 256;

/// Slot addresses for two chambers: moving targets first, then configs.
const MT_SLOT_1: usize = 0;
const CC_SLOT_1: usize = 2 * MovingTargets::SIZE;

type TestController = Controller<CountingEeprom, RecordingSink>;

fn params(mode: Mode, target: i16) -> ChamberParams {
    ChamberParams {
        batch_age_hours: -1,
        target_temp: target,
        next_target_temp: target,
        temp_min: -10,
        temp_max: 400,
        has_heater: true,
        cool_min_on_mins: 10,
        cool_min_off_mins: 15,
        cool_switch_on_lag_mins: 0,
        kp: 16.0,
        ki: 0.32,
        kd: 20.0,
        mode,
    }
}

/// Tuning with no startup grace so a single pass acts immediately.
fn no_grace() -> ControlTuning {
    ControlTuning {
        startup_grace_mins: 0,
        ..ControlTuning::default()
    }
}

fn make_controller(tuning: ControlTuning) -> TestController {
    Controller::new(
        tuning,
        CountingEeprom::new(EEPROM_BYTES),
        RecordingSink::default(),
        0,
    )
    .expect("controller should start")
}

/// Controller with chamber 1 in AUTO at 16.0 °C.
fn auto_controller() -> TestController {
    let mut ctl = make_controller(no_grace());
    ctl.apply_config(1, &params(Mode::Auto, 160))
        .expect("params should apply");
    ctl
}

// ── Construction ──────────────────────────────────────────────

#[test]
fn blank_eeprom_starts_with_defaults() {
    let ctl = make_controller(ControlTuning::default());
    assert_eq!(ctl.chamber_count(), 2);

    let c = ctl.chamber(1).expect("chamber 1");
    assert_eq!(c.config.mode, Mode::MonitorOnly);
    assert_eq!(c.targets.target_temp, 160);
    assert_eq!(c.targets.batch_age_hours, -1);

    let sink = ctl.diagnostics();
    assert_eq!(sink.count(Subsystem::Chamber, 'P'), 2, "both configs rejected");
    assert_eq!(sink.count(Subsystem::Chamber, 'T'), 2, "both targets rejected");
}

#[test]
fn invalid_tuning_is_rejected() {
    let tuning = ControlTuning {
        chamber_count: 0,
        ..ControlTuning::default()
    };
    let result = Controller::new(
        tuning,
        CountingEeprom::new(EEPROM_BYTES),
        RecordingSink::default(),
        0,
    );
    assert!(matches!(result, Err(Error::InvalidTuning(_))));
}

#[test]
fn undersized_eeprom_is_rejected() {
    let result = Controller::new(
        ControlTuning::default(),
        CountingEeprom::new(16),
        RecordingSink::default(),
        0,
    );
    assert!(result.is_err(), "two chambers need more than 16 bytes");
}

#[test]
fn persisted_records_survive_restart() {
    // A single apply: the second moving-targets save within the hour
    // would be throttled.
    let mut first = make_controller(no_grace());
    let mut p = params(Mode::Cool, 175);
    p.batch_age_hours = 30;
    first.apply_config(1, &p).expect("params should apply");
    let image = first.store().storage().image().to_vec();

    let second = Controller::new(
        no_grace(),
        CountingEeprom::from_image(&image),
        RecordingSink::default(),
        0,
    )
    .expect("restart");
    let c = second.chamber(1).expect("chamber 1");
    assert_eq!(c.config.mode, Mode::Cool);
    assert_eq!(c.targets.target_temp, 175);
    assert_eq!(c.targets.batch_age_hours, 30);
    assert!(
        second
            .diagnostics()
            .events
            .iter()
            .any(|e| e.code == 'p' && e.chamber == Some(1) && e.level == Level::Info)
    );
}

#[test]
fn corrupt_config_falls_back_but_targets_load() {
    let mut first = make_controller(no_grace());
    first
        .apply_config(1, &params(Mode::Auto, 175))
        .expect("params should apply");
    let mut image = first.store().storage().image().to_vec();
    image[CC_SLOT_1 + 5] ^= 0x10;

    let second = Controller::new(
        no_grace(),
        CountingEeprom::from_image(&image),
        RecordingSink::default(),
        0,
    )
    .expect("restart");
    let c = second.chamber(1).expect("chamber 1");
    assert_eq!(c.config.mode, Mode::MonitorOnly, "config fell back to default");
    assert_eq!(c.targets.target_temp, 175, "targets are independent");

    let rejected = second
        .diagnostics()
        .events
        .iter()
        .find(|e| e.code == 'P' && e.chamber == Some(1))
        .expect("rejection logged");
    assert_eq!(rejected.level, Level::Error);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn unknown_chamber_is_rejected() {
    let mut ctl = make_controller(ControlTuning::default());
    assert_eq!(
        ctl.apply_config(3, &params(Mode::Auto, 160)),
        Err(Error::UnknownChamber(3))
    );
    assert_eq!(ctl.read_snapshot(0).err(), Some(Error::UnknownChamber(0)));
    assert_eq!(
        ctl.set_local_mode(5, Some(Mode::Hold)),
        Err(Error::UnknownChamber(5))
    );
}

#[test]
fn invalid_params_leave_chamber_untouched() {
    let mut ctl = make_controller(ControlTuning::default());
    let mut p = params(Mode::Auto, 160);
    p.temp_min = 500;
    assert!(matches!(ctl.apply_config(1, &p), Err(Error::InvalidParams(_))));
    assert_eq!(
        ctl.chamber(1).expect("chamber 1").config.mode,
        Mode::MonitorOnly
    );
    assert!(ctl.store().storage().writes.is_empty());
}

#[test]
fn unchanged_config_is_not_rewritten() {
    let mut ctl = make_controller(ControlTuning::default());
    let p = params(Mode::Auto, 160);
    ctl.apply_config(1, &p).expect("first apply");
    ctl.apply_config(1, &p).expect("second apply");
    assert_eq!(ctl.store().storage().writes_at(CC_SLOT_1), 1);

    let mut changed = p;
    changed.kp = 12.0;
    ctl.apply_config(1, &changed).expect("third apply");
    assert_eq!(ctl.store().storage().writes_at(CC_SLOT_1), 2);
}

#[test]
fn storage_failure_is_reported() {
    let mut ctl = make_controller(ControlTuning::default());
    ctl.store_mut().storage_mut().fail_writes = true;

    let result = ctl.apply_config(1, &params(Mode::Auto, 160));
    assert_eq!(result, Err(Error::Storage(StorageError::IoError)));
    assert_eq!(
        ctl.chamber(1).expect("chamber 1").config.mode,
        Mode::Auto,
        "in-memory config still applied"
    );
    let event = ctl
        .diagnostics()
        .find(Subsystem::Store, 'W')
        .expect("write failure logged");
    assert_eq!(event.level, Level::Error);
}

#[test]
fn handle_command_routes_both_commands() {
    let mut ctl = make_controller(ControlTuning::default());
    ctl.handle_command(ControllerCommand::ApplyParams {
        chamber: 2,
        params: params(Mode::Hold, 150),
    })
    .expect("apply");
    ctl.handle_command(ControllerCommand::SetLocalMode {
        chamber: 2,
        mode: Some(Mode::DisableFridge),
    })
    .expect("override");

    let snap = ctl.read_snapshot(2).expect("snapshot");
    assert_eq!(snap.config.mode, Mode::Hold);
    assert_eq!(snap.effective_mode, Mode::DisableFridge);
    assert_eq!(snap.targets.target_temp, 150);
}

// ── Control scenarios ─────────────────────────────────────────

#[test]
fn zero_error_rising_trend_keeps_cooler_on() {
    let mut ctl = auto_controller();
    {
        let state = &mut ctl.chamber_mut(1).expect("chamber 1").state;
        state.cooler_on = true;
        state.cooler_last_toggle = DwellCounter::Elapsed(30);
        state.beer_trend = 5;
    }
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(160));

    ctl.run_control_pass(&mut hw);

    assert_eq!(hw.cooler(1), Some(true));
    assert!(ctl.chamber(1).expect("chamber 1").state.cooler_on);
    assert_eq!(ctl.diagnostics().count(Subsystem::Cooler, 'f'), 0);
}

#[test]
fn zero_error_flat_trend_releases_cooler() {
    let mut ctl = auto_controller();
    {
        let state = &mut ctl.chamber_mut(1).expect("chamber 1").state;
        state.cooler_on = true;
        state.cooler_last_toggle = DwellCounter::Elapsed(30);
        state.beer_trend = 0;
    }
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(160));

    ctl.run_control_pass(&mut hw);

    assert_eq!(hw.cooler(1), Some(false));
    assert_eq!(ctl.diagnostics().count(Subsystem::Cooler, 'f'), 1);
}

#[test]
fn cooler_held_until_min_on_time() {
    let mut ctl = auto_controller();
    {
        let state = &mut ctl.chamber_mut(1).expect("chamber 1").state;
        state.cooler_on = true;
        state.cooler_last_toggle = DwellCounter::Elapsed(3);
    }
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(160));

    ctl.run_control_pass(&mut hw);

    assert_eq!(hw.cooler(1), Some(true), "3 of 10 minutes run");
    assert_eq!(ctl.diagnostics().count(Subsystem::Cooler, 'g'), 1);
}

#[test]
fn heat_mode_runs_fixed_output_and_forces_cooler_off() {
    let mut ctl = make_controller(no_grace());
    ctl.apply_config(1, &params(Mode::Heat, 160))
        .expect("params should apply");
    {
        let state = &mut ctl.chamber_mut(1).expect("chamber 1").state;
        state.cooler_on = true;
        state.cooler_last_toggle = DwellCounter::Elapsed(0);
    }
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(180));

    ctl.run_control_pass(&mut hw);

    let snap = ctl.read_snapshot(1).expect("snapshot");
    assert_eq!(snap.heater_output_percent, 75);
    assert_eq!(snap.heater_last_toggle_mins, 0, "heat just started");
    assert!(!snap.cooler_on, "forced off despite minimum run time");
    assert_eq!(hw.cooler(1), Some(false));

    ctl.poll(3 * 60_000, &mut hw);
    let snap = ctl.read_snapshot(1).expect("snapshot");
    assert_eq!(snap.heater_output_percent, 75);
    assert_eq!(snap.heater_last_toggle_mins, 3);
}

#[test]
fn warm_beer_starts_cooling() {
    let mut ctl = auto_controller();
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(200));

    ctl.run_control_pass(&mut hw);

    assert_eq!(hw.cooler(1), Some(true));
    let snap = ctl.read_snapshot(1).expect("snapshot");
    assert_eq!(snap.heater_output_percent, 0);
    assert_eq!(snap.cooler_last_toggle_mins, 0);
}

#[test]
fn local_override_takes_precedence() {
    let mut ctl = auto_controller();
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(200));

    ctl.set_local_mode(1, Some(Mode::MonitorOnly))
        .expect("override");
    ctl.run_control_pass(&mut hw);
    assert_eq!(hw.cooler(1), Some(false));

    ctl.set_local_mode(1, None).expect("clear");
    ctl.run_control_pass(&mut hw);
    assert_eq!(hw.cooler(1), Some(true));
}

#[test]
fn startup_grace_holds_outputs_off() {
    let mut ctl = make_controller(ControlTuning::default());
    ctl.apply_config(1, &params(Mode::Auto, 160))
        .expect("params should apply");
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(200));

    ctl.poll(60_000, &mut hw);
    assert_eq!(ctl.uptime_mins(), 1);
    assert_eq!(hw.cooler(1), Some(false), "inside the grace period");

    ctl.poll(120_000, &mut hw);
    assert_eq!(hw.cooler(1), Some(true));
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn faulty_beer_probe_reads_as_target() {
    let mut ctl = auto_controller();
    let mut hw = MockHardware::new();
    hw.set_beer(1, Err(SensorError::Disconnected));
    hw.set_chamber(1, Ok(2000));

    ctl.run_control_pass(&mut hw);

    let snap = ctl.read_snapshot(1).expect("snapshot");
    assert_eq!(snap.beer_temp, 160);
    assert_eq!(snap.chamber_temp, 160, "implausible reading substituted");

    let sink = ctl.diagnostics();
    let beer = sink.find(Subsystem::Sensor, 'b').expect("beer fault logged");
    assert_eq!(beer.level, Level::Warn);
    assert_eq!(beer.chamber, Some(1));
    assert!(sink.find(Subsystem::Sensor, 'c').is_some());
}

#[test]
fn faulty_external_probe_reads_as_zero() {
    let mut ctl = auto_controller();
    let mut hw = MockHardware::new();
    hw.external = Err(SensorError::OutOfRange);

    ctl.run_control_pass(&mut hw);

    assert_eq!(ctl.external_temp(), 0);
    let event = ctl
        .diagnostics()
        .find(Subsystem::Sensor, 'x')
        .expect("external fault logged");
    assert_eq!(event.chamber, None);
}

// ── Persistence throttle ──────────────────────────────────────

#[test]
fn moving_targets_written_twice_in_61_minutes() {
    let mut ctl = auto_controller();
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(150));

    for minute in 1..=61u32 {
        ctl.poll(minute * 60_000, &mut hw);
    }

    assert_eq!(hw.conversions, 61, "one control pass per minute");
    assert_eq!(
        ctl.store().storage().writes_at(MT_SLOT_1),
        2,
        "first save at once, second after an hour"
    );
}

// ── Cooperative loop ──────────────────────────────────────────

#[test]
fn heat_output_pulses_through_poll() {
    let mut ctl = make_controller(no_grace());
    ctl.apply_config(1, &params(Mode::Heat, 160))
        .expect("params should apply");
    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(150));

    ctl.poll(60_000, &mut hw);
    assert_eq!(hw.heater(1), Some(true), "element starts at once");

    let mut on_secs = 0;
    for s in 1..=100u32 {
        ctl.poll(60_000 + s * 1000, &mut hw);
        if ctl.chamber(1).expect("chamber 1").state.heater_element_on {
            on_secs += 1;
        }
    }
    assert_eq!(on_secs, 75);
    assert!(
        hw.calls
            .iter()
            .any(|c| *c == ActuatorCall::Heater { chamber: 1, on: false })
    );
}

#[test]
fn poll_survives_millisecond_wraparound() {
    let start = u32::MAX - 29_999;
    let mut ctl = Controller::new(
        no_grace(),
        CountingEeprom::new(EEPROM_BYTES),
        RecordingSink::default(),
        start,
    )
    .expect("controller should start");
    let mut hw = MockHardware::new();

    ctl.poll(start.wrapping_add(30_000), &mut hw);
    assert_eq!(hw.conversions, 0, "half an interval");

    ctl.poll(start.wrapping_add(60_000), &mut hw);
    assert_eq!(hw.conversions, 1);
    assert_eq!(ctl.uptime_mins(), 1);
}

#[test]
fn long_stall_runs_a_single_pass() {
    let mut ctl = auto_controller();
    let mut hw = MockHardware::new();

    ctl.poll(10 * 60_000, &mut hw);

    assert_eq!(hw.conversions, 1);
    assert_eq!(ctl.uptime_mins(), 10);
}
