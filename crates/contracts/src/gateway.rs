//! GatewayConfig - Config Loader 输出
//!
//! 描述完整的网关配置：编码选项、文档存储、解析调度、看门狗、各事件类型的目标列表。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::TargetConfig;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的网关配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 网关设置
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Raddec 编码选项
    #[serde(default)]
    pub encoding: EncodingOptions,

    /// 文档存储节点 (可选)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_store: Option<DocumentStoreConfig>,

    /// 目标解析调度
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// 看门狗
    #[serde(default)]
    pub watchdog: WatchdogConfig,

    /// Raddec 目标 (按配置顺序分发)
    #[serde(default)]
    pub raddec_targets: Vec<TargetConfig>,

    /// Proximity 目标
    #[serde(default)]
    pub proximity_targets: Vec<TargetConfig>,

    /// Digest 目标
    #[serde(default)]
    pub digest_targets: Vec<TargetConfig>,
}

impl GatewayConfig {
    /// Raddecs are handed to the aggregator only when some derived list is configured.
    pub fn aggregation_enabled(&self) -> bool {
        !self.proximity_targets.is_empty() || !self.digest_targets.is_empty()
    }

    /// Iterate every target list with its config field name.
    pub fn target_lists(&self) -> [(&'static str, &[TargetConfig]); 3] {
        [
            ("raddec_targets", &self.raddec_targets),
            ("proximity_targets", &self.proximity_targets),
            ("digest_targets", &self.digest_targets),
        ]
    }

    pub fn uses_document_store(&self) -> bool {
        self.target_lists()
            .iter()
            .flat_map(|(_, targets)| targets.iter())
            .any(|t| matches!(t, TargetConfig::DocumentStore))
    }
}

/// 网关设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// UDP socket 是否允许广播
    #[serde(default = "default_true")]
    pub udp_broadcast: bool,

    /// 调试模式：错误输出完整详情
    #[serde(default)]
    pub debug: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            udp_broadcast: true,
            debug: false,
        }
    }
}

/// Raddec 编码选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingOptions {
    #[serde(default)]
    pub include_timestamp: bool,

    #[serde(default = "default_true")]
    pub include_packets: bool,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            include_timestamp: false,
            include_packets: true,
        }
    }
}

/// 文档存储节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    /// e.g. "http://192.168.1.10:9200"
    pub node: String,
}

/// 解析调度间隔
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// 存在无效目标时的短间隔
    #[serde(default = "default_invalid_interval_ms")]
    pub invalid_interval_ms: u64,

    /// 全部有效时的长间隔
    #[serde(default = "default_standard_interval_ms")]
    pub standard_interval_ms: u64,
}

impl ResolverConfig {
    pub fn invalid_interval(&self) -> Duration {
        Duration::from_millis(self.invalid_interval_ms)
    }

    pub fn standard_interval(&self) -> Duration {
        Duration::from_millis(self.standard_interval_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            invalid_interval_ms: default_invalid_interval_ms(),
            standard_interval_ms: default_standard_interval_ms(),
        }
    }
}

/// 看门狗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_watchdog_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_watchdog_lenience_ms")]
    pub lenience_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_watchdog_interval_ms(),
            lenience_ms: default_watchdog_lenience_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_invalid_interval_ms() -> u64 {
    2_000
}

fn default_standard_interval_ms() -> u64 {
    60_000
}

fn default_watchdog_interval_ms() -> u64 {
    5_000
}

fn default_watchdog_lenience_ms() -> u64 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: GatewayConfig = serde_json::from_str("{}").unwrap();
        assert!(config.gateway.udp_broadcast);
        assert!(!config.gateway.debug);
        assert!(!config.encoding.include_timestamp);
        assert!(config.encoding.include_packets);
        assert_eq!(config.resolver.invalid_interval(), Duration::from_secs(2));
        assert_eq!(config.resolver.standard_interval(), Duration::from_secs(60));
        assert_eq!(config.watchdog.interval_ms, 5_000);
        assert!(!config.aggregation_enabled());
        assert!(!config.uses_document_store());
    }

    #[test]
    fn test_aggregation_follows_derived_lists() {
        let config = GatewayConfig {
            digest_targets: vec![TargetConfig::DocumentStore],
            ..Default::default()
        };
        assert!(config.aggregation_enabled());
        assert!(config.uses_document_store());
    }
}
