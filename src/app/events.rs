//! Outbound diagnostics and read-side views.
//!
//! The [`Controller`](super::service::Controller) emits [`DiagnosticEvent`]s
//! through the [`DiagnosticSink`](super::ports::DiagnosticSink) port.
//! Adapters on the other side decide what to do with them: forward to the
//! `log` facade, hold them in the ring for the host to drain, etc.

use core::fmt;

use crate::chamber::{ChamberConfig, ChamberId, Mode, MovingTargets};

/// Severity, ordered so that eviction can compare levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub const fn tag(self) -> char {
        match self {
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

/// Emitting subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Chamber,
    Pid,
    Cooler,
    Heater,
    Sensor,
    Store,
}

impl Subsystem {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Chamber => "CD",
            Self::Pid => "PID",
            Self::Cooler => "F",
            Self::Heater => "H",
            Self::Sensor => "T",
            Self::Store => "EE",
        }
    }
}

/// Maximum values attached to one event.
pub const MAX_EVENT_VALUES: usize = 3;

/// One structured diagnostic record.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEvent {
    pub level: Level,
    pub subsystem: Subsystem,
    /// Single-character event code, unique within the subsystem.
    pub code: char,
    pub chamber: Option<u8>,
    pub values: heapless::Vec<f32, MAX_EVENT_VALUES>,
}

impl DiagnosticEvent {
    pub fn new(level: Level, subsystem: Subsystem, code: char) -> Self {
        Self {
            level,
            subsystem,
            code,
            chamber: None,
            values: heapless::Vec::new(),
        }
    }

    #[must_use]
    pub fn chamber(mut self, id: ChamberId) -> Self {
        self.chamber = Some(id.get());
        self
    }

    /// Attach a value. Values past the third are dropped.
    #[must_use]
    pub fn value(mut self, v: impl Into<f32>) -> Self {
        let _ = self.values.push(v.into());
        self
    }
}

impl fmt::Display for DiagnosticEvent {
    /// `<level>,<subsystem>,<code>,<chamber>[,<value>...]`, chamber 0 when
    /// the event is not chamber-specific.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.level.tag(),
            self.subsystem.tag(),
            self.code,
            self.chamber.unwrap_or(0)
        )?;
        for v in &self.values {
            write!(f, ",{v}")?;
        }
        Ok(())
    }
}

/// Point-in-time view of one chamber, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChamberSnapshot {
    pub chamber: u8,
    pub config: ChamberConfig,
    pub targets: MovingTargets,
    pub effective_mode: Mode,
    pub beer_temp: i16,
    pub chamber_temp: i16,
    pub external_temp: i16,
    pub heater_output_percent: u8,
    pub cooler_on: bool,
    pub cooler_last_toggle_mins: u8,
    /// Minutes since heat output last went between zero and non-zero.
    pub heater_last_toggle_mins: u8,
    pub beer_trend: i16,
}
