//! Gateway orchestration module.

mod aggregator;
mod orchestrator;
mod stats;

pub use aggregator::PipeAggregator;
pub use orchestrator::{Gateway, GatewayOptions, RaddecInput};
pub use stats::GatewayStats;
