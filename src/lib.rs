//! Multi-chamber fermentation temperature controller library.
//!
//! Exposes the control core (decision engine, actuator hysteresis, PID,
//! parameter store) behind hexagonal port traits, plus host-side adapters
//! for simulation and integration testing.

#![deny(unused_must_use)]

pub mod actuation;
pub mod adapters;
pub mod app;
pub mod chamber;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod persistence;
pub mod protocol;
pub mod timekeeping;

pub use app::service::Controller;
pub use error::{Error, Result};
