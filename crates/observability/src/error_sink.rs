//! ErrorSink - terminal point for resolution and delivery failures

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{ContractError, HealthSignal, NoopHealth, Signal};
use tracing::{debug, warn};

use crate::metrics::record_error;

/// Records failures without ever affecting control flow.
///
/// Cheap to clone; clones share the counter and the health output.
#[derive(Clone)]
pub struct ErrorSink {
    debug_mode: bool,
    health: Arc<dyn HealthSignal>,
    recorded: Arc<AtomicU64>,
}

impl ErrorSink {
    pub fn new(debug_mode: bool, health: Arc<dyn HealthSignal>) -> Self {
        Self {
            debug_mode,
            health,
            recorded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Sink with no health output (tests, tools)
    pub fn silent() -> Self {
        Self::new(false, Arc::new(NoopHealth))
    }

    /// Record one failure.
    pub fn record(&self, error: &ContractError) {
        self.health.signal(Signal::Error);
        self.recorded.fetch_add(1, Ordering::Relaxed);
        record_error(error.category());

        if self.debug_mode {
            warn!(category = error.category(), error = %error, detail = ?error, "Relay error");
        } else {
            debug!(category = error.category(), error = %error, "Relay error");
        }
    }

    /// Number of failures recorded so far
    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorSink")
            .field("debug_mode", &self.debug_mode)
            .field("recorded", &self.recorded())
            .finish()
    }
}
