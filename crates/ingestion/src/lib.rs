//! # Ingestion
//!
//! Upstream event sources for the relay.
//!
//! Responsibilities:
//! - Read raddecs / derived events as JSON lines (file, FIFO or stdin)
//! - Generate synthetic raddecs for dry runs
//! - Hand events downstream one at a time over `tokio::sync::mpsc`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::JsonLinesSource;
//! use contracts::Raddec;
//!
//! let source = JsonLinesSource::open("raddecs.ndjson").await?;
//! let (rx, task) = source.start::<Raddec>(100, None);
//! ```

mod config;
mod error;
mod json_lines;
mod mock;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::{DerivedEvent, Raddec};
pub use error::{IngestionError, Result};
pub use json_lines::JsonLinesSource;
pub use mock::{MockRaddecConfig, MockRaddecSource};
