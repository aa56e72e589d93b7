//! Wraparound-safe uptime bookkeeping.
//!
//! The time source is a free-running `u32` millisecond counter that wraps
//! after ~49.7 days. Every comparison goes through [`time_up`], which stays
//! correct across the wrap as long as intervals are shorter than the wrap
//! period.
//!
//! ```text
//!   now_ms ──▶ Uptime::advance ──▶ Ticks { seconds, minutes }
//!                                     │          │
//!                    heater pulse ◀───┘          └──▶ dwell counters
//! ```

/// True once `interval_ms` has elapsed since `prev_ms`.
pub fn time_up(prev_ms: u32, now_ms: u32, interval_ms: u32) -> bool {
    now_ms.wrapping_sub(prev_ms) >= interval_ms
}

const MS_PER_SECOND: u32 = 1_000;
const MS_PER_MINUTE: u32 = 60_000;

/// Whole seconds and minutes elapsed since the previous [`Uptime::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ticks {
    pub seconds: u32,
    pub minutes: u32,
}

/// Derives second and minute ticks from the millisecond counter.
///
/// Tick references advance by whole periods, never to `now`, so a late
/// caller catches up without drift.
#[derive(Debug, Clone)]
pub struct Uptime {
    prev_second_ms: u32,
    prev_minute_ms: u32,
    minutes: u32,
}

impl Uptime {
    pub fn new(now_ms: u32) -> Self {
        Self {
            prev_second_ms: now_ms,
            prev_minute_ms: now_ms,
            minutes: 0,
        }
    }

    /// Consume elapsed time up to `now_ms`.
    pub fn advance(&mut self, now_ms: u32) -> Ticks {
        let seconds = now_ms.wrapping_sub(self.prev_second_ms) / MS_PER_SECOND;
        self.prev_second_ms = self
            .prev_second_ms
            .wrapping_add(seconds.wrapping_mul(MS_PER_SECOND));

        let minutes = now_ms.wrapping_sub(self.prev_minute_ms) / MS_PER_MINUTE;
        self.prev_minute_ms = self
            .prev_minute_ms
            .wrapping_add(minutes.wrapping_mul(MS_PER_MINUTE));
        self.minutes = self.minutes.saturating_add(minutes);

        Ticks { seconds, minutes }
    }

    /// Whole minutes since construction.
    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}
