//! Fuzz target: `protocol::parse` and `protocol::dispatch`
//!
//! Feeds arbitrary text to the host line parser, then through a live
//! controller, and asserts that neither panics and that every request
//! gets at least one response line.
//!
//! cargo fuzz run fuzz_protocol_parse

#![no_main]

use chamberctl::Controller;
use chamberctl::adapters::eeprom::MemEeprom;
use chamberctl::config::ControlTuning;
use chamberctl::diagnostics::DiagnosticRing;
use chamberctl::protocol;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    let _ = protocol::parse(line);

    let Ok(mut ctl) = Controller::new(
        ControlTuning::default(),
        MemEeprom::new(256),
        DiagnosticRing::new(),
        0,
    ) else {
        return;
    };
    let mut out = String::new();
    protocol::dispatch(&mut ctl, line, &mut out).expect("String sink never fails");
    assert!(out.ends_with('\n'), "every request is answered");
});
