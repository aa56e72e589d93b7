//! Log-based diagnostic sink adapter.
//!
//! Implements [`DiagnosticSink`] by forwarding every event to the `log`
//! facade at the matching level, which goes to whatever logger the binary
//! installed (serial console in production).

use log::{debug, error, info, warn};

use crate::app::events::{DiagnosticEvent, Level};
use crate::app::ports::DiagnosticSink;

/// Adapter that logs every [`DiagnosticEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogDiagnostics;

impl LogDiagnostics {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for LogDiagnostics {
    fn record(&mut self, event: &DiagnosticEvent) {
        match event.level {
            Level::Error => error!("DIAG | {}", event),
            Level::Warn => warn!("DIAG | {}", event),
            Level::Info => info!("DIAG | {}", event),
            Level::Debug => debug!("DIAG | {}", event),
        }
    }
}
