//! Tracing-backed health signal

use contracts::{HealthSignal, Signal};
use tracing::trace;

/// Emits every health pulse as a `trace` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHealth;

impl HealthSignal for TracingHealth {
    fn signal(&self, signal: Signal) {
        trace!(target: "raddec_relay::health", ?signal, "health");
    }
}
