//! Host line protocol against a live controller.

use chamberctl::Controller;
use chamberctl::adapters::eeprom::MemEeprom;
use chamberctl::config::ControlTuning;
use chamberctl::diagnostics::{DiagnosticRing, LOG_RECORD_COUNT};
use chamberctl::protocol::dispatch;

use crate::mock_hw::MockHardware;

const SET_1: &str = "setChParams:1,48,180,170,-10,400,1,10,15,2,16.0,0.32,20.0,A";

fn controller() -> Controller<MemEeprom, DiagnosticRing> {
    Controller::new(
        ControlTuning::default(),
        MemEeprom::new(256),
        DiagnosticRing::new(),
        0,
    )
    .expect("controller should start")
}

fn send(ctl: &mut Controller<MemEeprom, DiagnosticRing>, line: &str) -> String {
    let mut out = String::new();
    dispatch(ctl, line, &mut out).expect("String never fails");
    out
}

#[test]
fn set_then_read_back() {
    let mut ctl = controller();
    assert_eq!(send(&mut ctl, SET_1), "ack\n");

    let mut hw = MockHardware::new();
    hw.set_beer(1, Ok(175));
    // Past the startup grace so the pass acts.
    ctl.poll(120_000, &mut hw);

    // Warm room and an exothermic batch: no heat, no cooling.
    assert_eq!(
        send(&mut ctl, "getChRds:1"),
        "chRds:48,180,170,-10,400,1,10,15,2,16,0.32,20,A,175,160,180,0,0\n"
    );
}

#[test]
fn readings_reply_has_no_project_box_field() {
    let mut ctl = controller();
    send(&mut ctl, SET_1);
    let reply = send(&mut ctl, "getChRds:1");
    let fields: Vec<&str> = reply
        .trim_end()
        .strip_prefix("chRds:")
        .expect("readings reply")
        .split(',')
        .collect();
    assert_eq!(fields.len(), 18);
    // Mode, then beer, chamber, external, heat output, cooler.
    assert_eq!(fields[12], "A");
    assert_eq!(fields[15], "0", "external before any probe read");
    assert_eq!(&fields[16..], ["0", "0"]);
}

#[test]
fn chamber_errors() {
    let mut ctl = controller();
    assert_eq!(send(&mut ctl, "getChRds:3"), "err:chamberId,3\n");
    assert_eq!(
        send(
            &mut ctl,
            "setChParams:9,48,180,170,-10,400,1,10,15,2,16.0,0.32,20.0,A"
        ),
        "err:chamberId,9\n"
    );
}

#[test]
fn param_and_parse_errors() {
    let mut ctl = controller();
    assert_eq!(
        send(
            &mut ctl,
            "setChParams:1,48,180,170,500,400,1,10,15,2,16.0,0.32,20.0,A"
        ),
        "err:params,temp_min must be below temp_max\n"
    );
    assert_eq!(
        send(
            &mut ctl,
            "setChParams:1,48,warm,170,-10,400,1,10,15,2,16.0,0.32,20.0,A"
        ),
        "err:parse,tTarget\n"
    );
    assert_eq!(send(&mut ctl, "getChRds:1,2"), "err:parse,trailing\n");
}

#[test]
fn unrecognised_command_echoed() {
    let mut ctl = controller();
    assert_eq!(send(&mut ctl, "reboot:now"), "UnrecCmd:reboot\n");
}

#[test]
fn status_reports_uptime_and_ejections() {
    let mut ctl = controller();
    let mut hw = MockHardware::new();
    ctl.poll(180_000, &mut hw);
    assert_eq!(send(&mut ctl, "status"), "status:3,180,0\n");

    // Every pass logs several debug records per chamber; a long run
    // overflows the ring.
    for minute in 4..=40u32 {
        ctl.poll(minute * 60_000, &mut hw);
    }
    assert_eq!(ctl.diagnostics().len(), LOG_RECORD_COUNT);
    assert_eq!(send(&mut ctl, "status"), "status:40,180,1\n");
    assert_eq!(send(&mut ctl, "status"), "status:40,180,0\n", "flag clears");
}

#[test]
fn log_messages_drain_the_ring() {
    let mut ctl = controller();
    let first = send(&mut ctl, "getLogMsgs");
    let lines: Vec<&str> = first.lines().collect();

    // Blank EEPROM: both records of both chambers rejected at startup.
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "logMsg:E,CD,P,1");
    assert_eq!(lines[1], "logMsg:E,CD,T,1");
    assert_eq!(lines[4], "ack");

    assert_eq!(send(&mut ctl, "getLogMsgs"), "ack\n");
    assert!(ctl.diagnostics().is_empty());
}
