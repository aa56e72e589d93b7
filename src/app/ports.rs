//! Port traits: the hexagonal boundary between control logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (temperature probes, relays, diagnostic log, EEPROM)
//! implement these traits. The [`Controller`](super::service::Controller)
//! consumes them via generics, so the control core never touches hardware
//! directly.

use core::fmt;

use crate::chamber::ChamberId;
use crate::error::SensorError;

use super::events::DiagnosticEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature source. All readings are tenths of a degree Celsius.
pub trait SensorPort {
    /// Kick off a conversion on every probe. Called once per control pass,
    /// before any read.
    fn request_readings(&mut self) {}

    fn read_beer_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError>;

    fn read_chamber_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError>;

    /// Ambient temperature outside all chambers.
    fn read_external_temp(&mut self) -> Result<i16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Raw relay outputs. Calls are idempotent; the controller re-asserts the
/// current state freely.
pub trait ActuatorPort {
    fn set_cooler(&mut self, chamber: ChamberId, on: bool);

    fn set_heater_element(&mut self, chamber: ChamberId, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Diagnostic sink port (driven adapter: domain → log)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget structured diagnostics. Implementations must not fail
/// or block the control pass.
pub trait DiagnosticSink {
    fn record(&mut self, event: &DiagnosticEvent);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &mut T {
    fn record(&mut self, event: &DiagnosticEvent) {
        (**self).record(event);
    }
}

/// Fan out to two sinks, e.g. the console and the host-facing ring.
impl<A: DiagnosticSink, B: DiagnosticSink> DiagnosticSink for (A, B) {
    fn record(&mut self, event: &DiagnosticEvent) {
        self.0.record(event);
        self.1.record(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ EEPROM)
// ───────────────────────────────────────────────────────────────

/// Fixed-size, byte-addressed non-volatile store.
///
/// Writes of unchanged bytes should be elided by the implementation to
/// spare cell endurance; callers never rely on it.
pub trait StoragePort {
    /// Total addressable bytes.
    fn capacity(&self) -> usize;

    /// Fill `buf` from `addr..addr + buf.len()`.
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Store `data` at `addr..addr + data.len()`.
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access extends past the end of the store.
    OutOfBounds,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "access out of bounds"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
