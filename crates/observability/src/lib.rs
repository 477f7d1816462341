//! # Observability
//!
//! 可观测性模块：Prometheus 指标 + health 信号 + 错误汇聚。
//!
//! ## 功能
//!
//! - Prometheus 指标导出
//! - `TracingHealth`：health 信号写入 tracing
//! - `ErrorSink`：解析与投递失败的终点
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{ErrorSink, TracingHealth};
//! use std::sync::Arc;
//!
//! observability::init_metrics_only(9000)?;
//! let errors = ErrorSink::new(false, Arc::new(TracingHealth));
//! errors.record(&err);
//! ```

mod error_sink;
mod health;
pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

// Re-exports
pub use crate::error_sink::ErrorSink;
pub use crate::health::TracingHealth;
pub use crate::metrics::{
    record_datagram_skipped, record_delivery, record_error, record_event_received,
    record_resolution, set_invalid_targets,
};

/// 启动 Prometheus 指标端点
///
/// Tracing 由二进制入口自行初始化。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
