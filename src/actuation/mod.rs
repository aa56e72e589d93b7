//! Actuator hysteresis controllers.
//!
//! Turn engine decisions into safe relay changes: the cooler dwell guard
//! protects the compressor, the heater pulse train realises a heat
//! percentage on an on/off element.

pub mod cooler;
pub mod heater;
