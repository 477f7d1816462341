//! Aggregator - external derived-event producer
//!
//! The relay hands every raddec to the aggregator; derived events come back
//! through their own inbound stream.

use crate::Raddec;

/// Consumer of the raw raddec stream.
pub trait Aggregator: Send + Sync {
    /// Receives each raddec verbatim, after target fan-out.
    fn handle_raddec(&self, raddec: &Raddec);
}
