//! Calibrating, smoothing sensor wrapper.
//!
//! Wraps any [`SensorPort`] and, per channel, adds a calibration offset and
//! averages each good reading with the previous good one. Faults pass
//! through untouched and do not disturb the running average. Chambers
//! beyond [`MAX_CHAMBERS`] have no channel and read raw.

use crate::app::ports::SensorPort;
use crate::chamber::ChamberId;
use crate::config::MAX_CHAMBERS;
use crate::error::SensorError;

#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    /// Added to every raw reading, tenths.
    offset: i16,
    prev: Option<i16>,
}

impl Channel {
    fn smooth(&mut self, raw: Result<i16, SensorError>) -> Result<i16, SensorError> {
        let reading = raw?.saturating_add(self.offset);
        let prev = self.prev.replace(reading).unwrap_or(reading);
        // Mean of two i16 values always fits.
        Ok(((i32::from(prev) + i32::from(reading)) / 2) as i16)
    }
}

/// Smoothing decorator around a raw probe bus.
pub struct SmoothedSensors<S> {
    inner: S,
    beer: [Channel; MAX_CHAMBERS],
    chamber: [Channel; MAX_CHAMBERS],
    external: Channel,
}

impl<S: SensorPort> SmoothedSensors<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            beer: [Channel::default(); MAX_CHAMBERS],
            chamber: [Channel::default(); MAX_CHAMBERS],
            external: Channel::default(),
        }
    }

    /// Calibration offsets (tenths) for one chamber's probes.
    /// Ignored for a chamber beyond [`MAX_CHAMBERS`].
    #[must_use]
    pub fn with_chamber_offsets(mut self, id: ChamberId, beer: i16, chamber: i16) -> Self {
        if let Some(ch) = self.beer.get_mut(id.index()) {
            ch.offset = beer;
        }
        if let Some(ch) = self.chamber.get_mut(id.index()) {
            ch.offset = chamber;
        }
        self
    }

    #[must_use]
    pub fn with_external_offset(mut self, offset: i16) -> Self {
        self.external.offset = offset;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: SensorPort> SensorPort for SmoothedSensors<S> {
    fn request_readings(&mut self) {
        self.inner.request_readings();
    }

    fn read_beer_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError> {
        let raw = self.inner.read_beer_temp(chamber);
        match self.beer.get_mut(chamber.index()) {
            Some(ch) => ch.smooth(raw),
            None => raw,
        }
    }

    fn read_chamber_temp(&mut self, chamber: ChamberId) -> Result<i16, SensorError> {
        let raw = self.inner.read_chamber_temp(chamber);
        match self.chamber.get_mut(chamber.index()) {
            Some(ch) => ch.smooth(raw),
            None => raw,
        }
    }

    fn read_external_temp(&mut self) -> Result<i16, SensorError> {
        let raw = self.inner.read_external_temp();
        self.external.smooth(raw)
    }
}
