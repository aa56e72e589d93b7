//! Control algorithms: per-chamber decision engine and PID tracking.

pub mod engine;
pub mod pid;
