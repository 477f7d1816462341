//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the relay.
//! Business crates depend on this crate only, never on each other's internals.
//!
//! ## Time Model
//! - Event timestamps are milliseconds since the Unix epoch (u64)
//! - Document-store timestamps are normalized to RFC 3339 at encode time

mod aggregator;
mod derived;
mod error;
mod gateway;
mod health;
mod raddec;
mod target;

pub use aggregator::*;
pub use derived::*;
pub use error::*;
pub use gateway::*;
pub use health::*;
pub use raddec::*;
pub use target::*;
