//! Unified error types for the chamber controller.
//!
//! A single `Error` enum that every subsystem converts into. All variants are
//! `Copy` so they pass through the control pass without allocation. None of
//! them halt the control loop: the service logs and substitutes a safe
//! default, and only the configuration entry points surface them to callers.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A chamber id outside `1..=chamber_count` was supplied.
    UnknownChamber(u8),
    /// A tuning value failed range validation.
    InvalidTuning(&'static str),
    /// Host-supplied chamber parameters failed validation.
    InvalidParams(&'static str),
    /// The non-volatile byte store rejected an access.
    Storage(StorageError),
    /// A persisted record could not be trusted.
    Record(RecordError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChamber(id) => write!(f, "unknown chamber id {id}"),
            Self::InvalidTuning(msg) => write!(f, "tuning: {msg}"),
            Self::InvalidParams(msg) => write!(f, "params: {msg}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Record(e) => write!(f, "record: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Record errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// Stored checksum does not match the one computed over the slot.
    Checksum { stored: u16, computed: u16 },
    /// Slot bytes are not a valid encoding of the record.
    Decode,
    /// The record did not serialise into its fixed slot size.
    Encode,
    /// Record decoded cleanly but belongs to a different chamber.
    ChamberMismatch { expected: u8, found: u8 },
    /// The slot lies outside the store.
    OutOfBounds,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checksum { stored, computed } => {
                write!(f, "checksum mismatch (stored {stored:#06x}, computed {computed:#06x})")
            }
            Self::Decode => write!(f, "undecodable slot"),
            Self::Encode => write!(f, "record does not fit its slot"),
            Self::ChamberMismatch { expected, found } => {
                write!(f, "slot for chamber {expected} holds chamber {found}")
            }
            Self::OutOfBounds => write!(f, "slot outside store"),
        }
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Probe fault. Never surfaces as an [`Error`]: the control pass substitutes
/// a safe reading and logs the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The probe did not answer (bus fault or unplugged).
    Disconnected,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "probe disconnected"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
