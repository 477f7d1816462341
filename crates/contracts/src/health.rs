//! Health signal - generic status-indication output

/// Status pulses emitted by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Periodic "process alive" toggle
    Heartbeat,
    /// A raddec fan-out has begun
    ForwardingStarted,
    /// A raddec fan-out has been issued
    ForwardingFinished,
    /// A failure reached the error sink
    Error,
}

/// Sink for health pulses (LEDs, logs, ...).
///
/// Implementations must be cheap and must never block.
pub trait HealthSignal: Send + Sync {
    fn signal(&self, signal: Signal);
}

/// Discards every pulse.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHealth;

impl HealthSignal for NoopHealth {
    fn signal(&self, _signal: Signal) {}
}
