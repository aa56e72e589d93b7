//! Relay bank adapter.
//!
//! Drives the cooler (compressor) and heater relays through
//! `embedded_hal` output pins. The relay modules are low-level trigger, so
//! a relay is ON when its pin is LOW. Every relay is driven OFF at
//! construction, before the controller runs.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::ActuatorPort;
use crate::chamber::ChamberId;
use crate::config::MAX_CHAMBERS;

/// One relay on one pin.
pub struct Relay<P> {
    pin: P,
    /// If true, relay ON = pin LOW
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> Relay<P> {
    /// Wrap `pin` and switch the relay off. A failed first write leaves
    /// the relay reported OFF.
    pub fn new(pin: P, active_low: bool) -> Self {
        let mut relay = Self {
            pin,
            active_low,
            on: false,
        };
        relay.set(false);
        relay
    }

    pub fn set(&mut self, on: bool) {
        let drive_high = on != self.active_low;
        let res = if drive_high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.on = on,
            Err(e) => warn!("relay pin write failed: {:?}", e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn release(self) -> P {
        self.pin
    }
}

/// Cooler and heater relays of one chamber.
pub struct ChamberRelays<P> {
    pub cooler: Relay<P>,
    pub heater: Relay<P>,
}

/// Relays for every chamber, indexed by chamber id.
pub struct RelayBank<P> {
    chambers: heapless::Vec<ChamberRelays<P>, MAX_CHAMBERS>,
}

impl<P: OutputPin> RelayBank<P> {
    /// Build from `(cooler_pin, heater_pin)` pairs in chamber order.
    /// Pairs beyond [`MAX_CHAMBERS`] are ignored.
    pub fn new_active_low(pins: impl IntoIterator<Item = (P, P)>) -> Self {
        let mut chambers = heapless::Vec::new();
        for (cooler, heater) in pins.into_iter().take(MAX_CHAMBERS) {
            let _ = chambers.push(ChamberRelays {
                cooler: Relay::new(cooler, true),
                heater: Relay::new(heater, true),
            });
        }
        Self { chambers }
    }

    pub fn chamber(&self, id: ChamberId) -> Option<&ChamberRelays<P>> {
        self.chambers.get(id.index())
    }
}

impl<P: OutputPin> ActuatorPort for RelayBank<P> {
    fn set_cooler(&mut self, chamber: ChamberId, on: bool) {
        match self.chambers.get_mut(chamber.index()) {
            Some(r) => r.cooler.set(on),
            None => warn!("no cooler relay wired for chamber {chamber}"),
        }
    }

    fn set_heater_element(&mut self, chamber: ChamberId, on: bool) {
        match self.chambers.get_mut(chamber.index()) {
            Some(r) => r.heater.set(on),
            None => warn!("no heater relay wired for chamber {chamber}"),
        }
    }
}
