//! 转发指标
//!
//! 基于 `metrics` 宏记录，未安装 recorder 时为空操作。

use metrics::{counter, gauge};

/// 记录上游事件到达 (raddec / proximity / digest)
pub fn record_event_received(kind: &'static str) {
    counter!("raddec_relay_events_received_total", "kind" => kind).increment(1);
}

/// 记录一次投递结果
pub fn record_delivery(transport: &'static str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "raddec_relay_deliveries_total",
        "transport" => transport,
        "status" => status
    )
    .increment(1);
}

/// 记录因地址无效而跳过的 datagram 发送
pub fn record_datagram_skipped(host: &str) {
    counter!(
        "raddec_relay_datagram_skipped_total",
        "host" => host.to_string()
    )
    .increment(1);
}

/// 记录一次主机名解析结果
pub fn record_resolution(host: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "raddec_relay_resolutions_total",
        "host" => host.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 当前无效的 datagram 目标数
pub fn set_invalid_targets(count: usize) {
    gauge!("raddec_relay_invalid_targets").set(count as f64);
}

/// 记录进入 ErrorSink 的错误
pub fn record_error(category: &'static str) {
    counter!("raddec_relay_errors_total", "category" => category).increment(1);
}
