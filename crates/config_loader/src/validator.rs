//! 配置校验模块
//!
//! 校验规则：
//! - 目标 host 非空、port 非零
//! - webhook path 以 '/' 开头
//! - 派生事件目标不支持 datagram
//! - document_store 目标必须配置存储节点
//! - 解析间隔：0 < invalid_interval_ms < standard_interval_ms
//! - 看门狗启用时 interval_ms > 0

use contracts::{ContractError, GatewayConfig, TargetConfig};
use reqwest::Url;

/// 校验 GatewayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &GatewayConfig) -> Result<(), ContractError> {
    validate_targets(config)?;
    validate_derived_transports(config)?;
    validate_document_store(config)?;
    validate_resolver(config)?;
    validate_watchdog(config)?;
    Ok(())
}

/// 校验每个目标的连接参数
fn validate_targets(config: &GatewayConfig) -> Result<(), ContractError> {
    for (list, targets) in config.target_lists() {
        for (idx, target) in targets.iter().enumerate() {
            match target {
                TargetConfig::Datagram { host, port } => {
                    validate_endpoint(list, idx, host, *port)?;
                }
                TargetConfig::Webhook {
                    host, port, path, ..
                } => {
                    validate_endpoint(list, idx, host, *port)?;
                    if let Some(path) = path {
                        if !path.starts_with('/') {
                            return Err(ContractError::config_validation(
                                format!("{list}[{idx}].path"),
                                format!("path must start with '/', got '{path}'"),
                            ));
                        }
                    }
                }
                TargetConfig::DocumentStore => {}
            }
        }
    }
    Ok(())
}

fn validate_endpoint(list: &str, idx: usize, host: &str, port: u16) -> Result<(), ContractError> {
    if host.trim().is_empty() {
        return Err(ContractError::config_validation(
            format!("{list}[{idx}].host"),
            "host cannot be empty",
        ));
    }
    if port == 0 {
        return Err(ContractError::config_validation(
            format!("{list}[{idx}].port"),
            "port must be > 0",
        ));
    }
    Ok(())
}

/// 派生事件只支持 webhook / document_store
fn validate_derived_transports(config: &GatewayConfig) -> Result<(), ContractError> {
    for (list, targets) in [
        ("proximity_targets", &config.proximity_targets),
        ("digest_targets", &config.digest_targets),
    ] {
        if let Some(idx) = targets
            .iter()
            .position(|t| matches!(t, TargetConfig::Datagram { .. }))
        {
            return Err(ContractError::config_validation(
                format!("{list}[{idx}].transport"),
                "datagram transport is only supported for raddec targets",
            ));
        }
    }
    Ok(())
}

/// 校验文档存储节点
fn validate_document_store(config: &GatewayConfig) -> Result<(), ContractError> {
    let Some(store) = &config.document_store else {
        if config.uses_document_store() {
            return Err(ContractError::config_validation(
                "document_store.node",
                "document_store targets configured but no document_store node given",
            ));
        }
        return Ok(());
    };

    let url = Url::parse(&store.node).map_err(|e| {
        ContractError::config_validation(
            "document_store.node",
            format!("invalid node url '{}': {e}", store.node),
        )
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ContractError::config_validation(
            "document_store.node",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

/// 校验解析间隔
fn validate_resolver(config: &GatewayConfig) -> Result<(), ContractError> {
    let resolver = &config.resolver;
    if resolver.invalid_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "resolver.invalid_interval_ms",
            "interval must be > 0",
        ));
    }
    if resolver.invalid_interval_ms >= resolver.standard_interval_ms {
        return Err(ContractError::config_validation(
            "resolver.invalid_interval_ms / resolver.standard_interval_ms",
            format!(
                "invalid_interval_ms ({}) must be < standard_interval_ms ({})",
                resolver.invalid_interval_ms, resolver.standard_interval_ms
            ),
        ));
    }
    Ok(())
}

/// 校验看门狗
fn validate_watchdog(config: &GatewayConfig) -> Result<(), ContractError> {
    if config.watchdog.enabled && config.watchdog.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "watchdog.interval_ms",
            "interval must be > 0 when the watchdog is enabled",
        ));
    }
    Ok(())
}
