//! Application core: control orchestration with no direct I/O.
//!
//! The [`service::Controller`] sequences sensor reads, decisions, actuation
//! and persistence. All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
