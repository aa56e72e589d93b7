//! Chamber domain model.
//!
//! Each chamber carries three layers of data:
//!
//! ```text
//!   ChamberConfig   persisted, written on change      (host-owned)
//!   MovingTargets   persisted, write-throttled        (host + PID)
//!   ChamberState    runtime only, rebuilt every boot  (controller)
//! ```
//!
//! [`ChamberSet`] owns the chambers in a fixed-capacity collection and is
//! the only place a raw host-supplied id is mapped to an index.

pub mod dwell;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MAX_CHAMBERS;
use crate::error::Error;

pub use dwell::DwellCounter;

// ───────────────────────────────────────────────────────────────
// Chamber id
// ───────────────────────────────────────────────────────────────

/// A chamber id validated against the configured chamber count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChamberId(u8);

impl ChamberId {
    /// Validate `raw` against `1..=count`.
    pub fn new(raw: u8, count: u8) -> Result<Self, Error> {
        if raw == 0 || raw > count {
            return Err(Error::UnknownChamber(raw));
        }
        Ok(Self(raw))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based slot index.
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for ChamberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Operating mode
// ───────────────────────────────────────────────────────────────

/// Operating mode. Serialised as its single-character host code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Mode {
    Auto,
    Hold,
    Heat,
    Cool,
    MonitorOnly,
    DisableHeater,
    DisableFridge,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Auto,
        Mode::Hold,
        Mode::Heat,
        Mode::Cool,
        Mode::MonitorOnly,
        Mode::DisableHeater,
        Mode::DisableFridge,
    ];

    pub const fn code(self) -> char {
        match self {
            Self::Auto => 'A',
            Self::Hold => 'H',
            Self::Heat => '+',
            Self::Cool => '-',
            Self::MonitorOnly => 'M',
            Self::DisableHeater => '*',
            Self::DisableFridge => '~',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Modes resolved by the full heat/cool arbitration.
    pub const fn arbitrates(self) -> bool {
        matches!(
            self,
            Self::Auto | Self::Hold | Self::DisableHeater | Self::DisableFridge
        )
    }
}

impl From<Mode> for u8 {
    fn from(m: Mode) -> u8 {
        m.code() as u8
    }
}

/// Rejected mode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidModeCode(pub u8);

impl fmt::Display for InvalidModeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid mode code {:#04x}", self.0)
    }
}

impl TryFrom<u8> for Mode {
    type Error = InvalidModeCode;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        Mode::from_code(b as char).ok_or(InvalidModeCode(b))
    }
}

// ───────────────────────────────────────────────────────────────
// Persisted records
// ───────────────────────────────────────────────────────────────

/// Per-chamber configuration pushed by the host.
///
/// Integers are encoded fixed-width so the record occupies a fixed slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChamberConfig {
    pub chamber_id: u8,
    pub mode: Mode,
    pub has_heater: bool,
    pub cool_min_on_mins: u8,
    pub cool_min_off_mins: u8,
    pub cool_switch_on_lag_mins: u8,
    #[serde(with = "postcard::fixint::le")]
    pub temp_min: i16,
    #[serde(with = "postcard::fixint::le")]
    pub temp_max: i16,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    #[serde(with = "postcard::fixint::le")]
    pub checksum: u16,
}

impl ChamberConfig {
    pub fn default_for(id: ChamberId) -> Self {
        Self {
            chamber_id: id.get(),
            mode: Mode::MonitorOnly,
            has_heater: true,
            cool_min_on_mins: 10,
            cool_min_off_mins: 15,
            cool_switch_on_lag_mins: 0,
            temp_min: -10,
            temp_max: 400,
            kp: 16.0,
            ki: 0.32,
            kd: 20.0,
            checksum: 0,
        }
    }

    /// Minutes the cooler must run before a normal OFF request is honoured.
    pub fn cool_min_run_mins(&self) -> u16 {
        u16::from(self.cool_min_on_mins) + u16::from(self.cool_switch_on_lag_mins)
    }
}

/// Fast-changing per-chamber targets and PID memory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingTargets {
    #[serde(with = "postcard::fixint::le")]
    pub target_temp: i16,
    #[serde(with = "postcard::fixint::le")]
    pub next_target_temp: i16,
    /// Hours since pitching, `-1` when not applicable.
    #[serde(with = "postcard::fixint::le")]
    pub batch_age_hours: i16,
    pub integral: f32,
    #[serde(with = "postcard::fixint::le")]
    pub checksum: u16,
}

impl Default for MovingTargets {
    fn default() -> Self {
        Self {
            target_temp: 160,
            next_target_temp: 160,
            batch_age_hours: -1,
            integral: 0.0,
            checksum: 0,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Runtime state
// ───────────────────────────────────────────────────────────────

/// Runtime-only chamber state. Fresh on every boot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChamberState {
    /// Mode selected on the local panel; wins over the host's mode.
    pub local_mode_override: Option<Mode>,
    pub beer_temp: i16,
    pub chamber_temp: i16,
    pub cooler_on: bool,
    /// Minutes since the cooler changed state.
    pub cooler_last_toggle: DwellCounter,
    /// Minutes since heat output went between zero and non-zero.
    pub heater_last_toggle: DwellCounter,
    pub heater_output_percent: u8,
    pub heater_element_on: bool,
    /// Seconds since the heater element changed state.
    pub heater_element_last_toggle: DwellCounter,
    pub prior_error: i16,
    pub beer_trend: i16,
}

/// One chamber: id plus its three data layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chamber {
    pub id: ChamberId,
    pub config: ChamberConfig,
    pub targets: MovingTargets,
    pub state: ChamberState,
}

impl Chamber {
    pub fn new(id: ChamberId) -> Self {
        Self {
            id,
            config: ChamberConfig::default_for(id),
            targets: MovingTargets::default(),
            state: ChamberState::default(),
        }
    }

    /// Local override if set, otherwise the host-configured mode.
    pub fn effective_mode(&self) -> Mode {
        self.state.local_mode_override.unwrap_or(self.config.mode)
    }
}

// ───────────────────────────────────────────────────────────────
// Chamber collection
// ───────────────────────────────────────────────────────────────

/// Fixed-capacity owner of all chambers, ids `1..=count`.
#[derive(Debug, Clone)]
pub struct ChamberSet {
    chambers: heapless::Vec<Chamber, MAX_CHAMBERS>,
}

impl ChamberSet {
    /// Build `count` chambers with default records.
    pub fn new(count: u8) -> Result<Self, Error> {
        if count == 0 || count as usize > MAX_CHAMBERS {
            return Err(Error::InvalidTuning("chamber_count must be 1-4"));
        }
        let mut chambers = heapless::Vec::new();
        for raw in 1..=count {
            let id = ChamberId::new(raw, count)?;
            // Capacity checked above.
            let _ = chambers.push(Chamber::new(id));
        }
        Ok(Self { chambers })
    }

    pub fn count(&self) -> u8 {
        self.chambers.len() as u8
    }

    /// Map a raw host id to a validated [`ChamberId`].
    pub fn resolve(&self, raw: u8) -> Result<ChamberId, Error> {
        ChamberId::new(raw, self.count())
    }

    pub fn get(&self, raw: u8) -> Result<&Chamber, Error> {
        let id = self.resolve(raw)?;
        self.chambers
            .get(id.index())
            .ok_or(Error::UnknownChamber(raw))
    }

    pub fn get_mut(&mut self, raw: u8) -> Result<&mut Chamber, Error> {
        let id = self.resolve(raw)?;
        self.chambers
            .get_mut(id.index())
            .ok_or(Error::UnknownChamber(raw))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chamber> {
        self.chambers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chamber> {
        self.chambers.iter_mut()
    }
}
