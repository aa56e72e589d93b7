//! Saturating dwell-time counter.
//!
//! Counts whole minutes (cooler, heater output) or seconds (heater element)
//! since an actuator last changed state. A counter that has never been reset
//! since startup is `Unknown` and, like a saturated one, satisfies every
//! dwell guard, so a freshly booted controller may switch immediately.

/// Units elapsed since the last actuator change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DwellCounter {
    /// No change observed since startup.
    #[default]
    Unknown,
    /// Units since the last change, saturating at `u8::MAX`.
    Elapsed(u8),
}

impl DwellCounter {
    /// Counter value reported to hosts. `Unknown` reads as saturated.
    pub const fn value(self) -> u8 {
        match self {
            Self::Unknown => u8::MAX,
            Self::Elapsed(n) => n,
        }
    }

    /// Restart counting from zero. Called only when the actuator changes.
    pub fn reset(&mut self) {
        *self = Self::Elapsed(0);
    }

    /// Advance by one unit.
    pub fn tick(&mut self) {
        if let Self::Elapsed(n) = self {
            *n = n.saturating_add(1);
        }
    }

    /// True once at least `units` have elapsed.
    pub fn at_least(self, units: u16) -> bool {
        match self {
            Self::Unknown | Self::Elapsed(u8::MAX) => true,
            Self::Elapsed(n) => u16::from(n) >= units,
        }
    }

    pub const fn is_saturated(self) -> bool {
        matches!(self, Self::Unknown | Self::Elapsed(u8::MAX))
    }
}
