//! Diagnostics sinks
//!
//! A sink is handed to the client at construction time and receives the
//! outbound request tree, the normalized result and any fault. Sinks observe
//! only; they cannot change what a call returns.

use log::debug;
use serde_json::Value;

/// Receives labelled diagnostic values from the dispatcher
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, label: &str, value: &Value);
}

/// Forwards diagnostics to the `log` facade at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn emit(&self, label: &str, value: &Value) {
        debug!(target: "tripolis::diagnostics", "{}: {}", label, value);
    }
}
