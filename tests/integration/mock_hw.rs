//! Mock hardware adapters for host-side integration tests.
//!
//! Implements the port traits with in-memory state and call logging so
//! tests can set probe readings and assert on relay traffic, EEPROM writes
//! and diagnostics without real hardware.

use std::collections::HashMap;

use chamberctl::app::events::{DiagnosticEvent, Level, Subsystem};
use chamberctl::app::ports::{ActuatorPort, DiagnosticSink, SensorPort, StorageError, StoragePort};
use chamberctl::chamber::ChamberId;
use chamberctl::error::SensorError;

// ── Probes and relays ─────────────────────────────────────────

/// Recorded relay call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Cooler { chamber: u8, on: bool },
    Heater { chamber: u8, on: bool },
}

/// Combined sensor + actuator mock. Unset probes read 16.0 °C, the
/// outside probe 18.0 °C.
pub struct MockHardware {
    pub beer: HashMap<u8, Result<i16, SensorError>>,
    pub chamber: HashMap<u8, Result<i16, SensorError>>,
    pub external: Result<i16, SensorError>,
    pub conversions: usize,
    pub calls: Vec<ActuatorCall>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            beer: HashMap::new(),
            chamber: HashMap::new(),
            external: Ok(180),
            conversions: 0,
            calls: Vec::new(),
        }
    }

    pub fn set_beer(&mut self, chamber: u8, reading: Result<i16, SensorError>) {
        self.beer.insert(chamber, reading);
    }

    pub fn set_chamber(&mut self, chamber: u8, reading: Result<i16, SensorError>) {
        self.chamber.insert(chamber, reading);
    }

    /// Last commanded cooler state for `chamber`, if any.
    pub fn cooler(&self, chamber: u8) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match *c {
            ActuatorCall::Cooler { chamber: id, on } if id == chamber => Some(on),
            _ => None,
        })
    }

    /// Last commanded heater element state for `chamber`, if any.
    pub fn heater(&self, chamber: u8) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match *c {
            ActuatorCall::Heater { chamber: id, on } if id == chamber => Some(on),
            _ => None,
        })
    }
}

impl SensorPort for MockHardware {
    fn request_readings(&mut self) {
        self.conversions += 1;
    }

    fn read_beer_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError> {
        self.beer.get(&chamber.get()).copied().unwrap_or(Ok(160))
    }

    fn read_chamber_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError> {
        self.chamber.get(&chamber.get()).copied().unwrap_or(Ok(160))
    }

    fn read_external_temp(&mut self) -> Result<i16, SensorError> {
        self.external
    }
}

impl ActuatorPort for MockHardware {
    fn set_cooler(&mut self, chamber: ChamberId, on: bool) {
        self.calls.push(ActuatorCall::Cooler {
            chamber: chamber.get(),
            on,
        });
    }

    fn set_heater_element(&mut self, chamber: ChamberId, on: bool) {
        self.calls.push(ActuatorCall::Heater {
            chamber: chamber.get(),
            on,
        });
    }
}

// ── EEPROM ────────────────────────────────────────────────────

/// Byte store that logs every write call by start address.
pub struct CountingEeprom {
    cells: Vec<u8>,
    pub writes: Vec<usize>,
    pub fail_writes: bool,
}

impl CountingEeprom {
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![0xFF; capacity],
            writes: Vec::new(),
            fail_writes: false,
        }
    }

    pub fn from_image(image: &[u8]) -> Self {
        Self {
            cells: image.to_vec(),
            writes: Vec::new(),
            fail_writes: false,
        }
    }

    pub fn image(&self) -> &[u8] {
        &self.cells
    }

    pub fn writes_at(&self, addr: usize) -> usize {
        self.writes.iter().filter(|&&a| a == addr).count()
    }
}

impl StoragePort for CountingEeprom {
    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let src = self
            .cells
            .get(addr..addr + buf.len())
            .ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        let dst = self
            .cells
            .get_mut(addr..addr + data.len())
            .ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        self.writes.push(addr);
        Ok(())
    }
}

// ── Diagnostics ───────────────────────────────────────────────

/// Sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<DiagnosticEvent>,
}

impl RecordingSink {
    pub fn count(&self, subsystem: Subsystem, code: char) -> usize {
        self.events
            .iter()
            .filter(|e| e.subsystem == subsystem && e.code == code)
            .count()
    }

    pub fn find(&self, subsystem: Subsystem, code: char) -> Option<&DiagnosticEvent> {
        self.events
            .iter()
            .find(|e| e.subsystem == subsystem && e.code == code)
    }

    pub fn at_level(&self, level: Level) -> usize {
        self.events.iter().filter(|e| e.level == level).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&mut self, event: &DiagnosticEvent) {
        self.events.push(event.clone());
    }
}
