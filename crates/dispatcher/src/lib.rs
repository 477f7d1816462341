//! # Dispatcher
//!
//! 事件分发模块。
//!
//! 负责：
//! - 消费 raddec 与 derived 事件
//! - 按配置顺序 fan-out 到各 target (datagram / webhook / document store)
//! - 单个 target 失败不影响其他 target，失败统一交给 `ErrorSink`

pub mod dispatcher;
pub mod encoders;
pub mod error;
pub mod metrics;
pub mod target;
pub mod transport;
pub mod watchdog;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, TargetMetrics};
pub use target::{Route, Target};
pub use transport::{Delivery, LocalDelivery, Transports, WebhookRequest};
pub use watchdog::{Watchdog, WatchdogFeed};
