//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{GatewayConfig, TargetConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    udp_broadcast: bool,
    debug: bool,
    include_timestamp: bool,
    include_packets: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_store: Option<String>,
    resolver: ResolverInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    watchdog: Option<WatchdogInfo>,
    aggregation: bool,
    target_lists: Vec<TargetListInfo>,
}

#[derive(Serialize)]
struct ResolverInfo {
    invalid_interval_ms: u64,
    standard_interval_ms: u64,
}

#[derive(Serialize)]
struct WatchdogInfo {
    interval_ms: u64,
    lenience_ms: u64,
}

#[derive(Serialize)]
struct TargetListInfo {
    name: &'static str,
    count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    targets: Vec<TargetInfo>,
}

#[derive(Serialize)]
struct TargetInfo {
    transport: &'static str,
    destination: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &GatewayConfig, args: &InfoArgs) -> ConfigInfo {
    let target_lists = config
        .target_lists()
        .into_iter()
        .map(|(name, targets)| TargetListInfo {
            name,
            count: targets.len(),
            targets: if args.targets {
                targets.iter().map(target_info).collect()
            } else {
                Vec::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        udp_broadcast: config.gateway.udp_broadcast,
        debug: config.gateway.debug,
        include_timestamp: config.encoding.include_timestamp,
        include_packets: config.encoding.include_packets,
        document_store: config.document_store.as_ref().map(|s| s.node.clone()),
        resolver: ResolverInfo {
            invalid_interval_ms: config.resolver.invalid_interval_ms,
            standard_interval_ms: config.resolver.standard_interval_ms,
        },
        watchdog: config.watchdog.enabled.then_some(WatchdogInfo {
            interval_ms: config.watchdog.interval_ms,
            lenience_ms: config.watchdog.lenience_ms,
        }),
        aggregation: config.aggregation_enabled(),
        target_lists,
    }
}

fn target_info(target: &TargetConfig) -> TargetInfo {
    TargetInfo {
        transport: target.transport(),
        destination: target.describe(),
    }
}

fn print_config_info(config: &GatewayConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Raddec Relay Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Gateway");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ UDP broadcast: {}", config.gateway.udp_broadcast);
    println!("   ├─ Debug: {}", config.gateway.debug);
    println!(
        "   ├─ Encoding: timestamp={}, packets={}",
        config.encoding.include_timestamp, config.encoding.include_packets
    );
    match &config.document_store {
        Some(store) => println!("   └─ Document store: {}", store.node),
        None => println!("   └─ Document store: (none)"),
    }

    println!("\nResolver");
    println!("   ├─ Invalid interval: {} ms", config.resolver.invalid_interval_ms);
    println!("   └─ Standard interval: {} ms", config.resolver.standard_interval_ms);

    println!("\nWatchdog");
    if config.watchdog.enabled {
        println!(
            "   └─ {} ms (+{} ms lenience)",
            config.watchdog.interval_ms, config.watchdog.lenience_ms
        );
    } else {
        println!("   └─ disabled");
    }

    for (name, targets) in config.target_lists() {
        println!("\n{} ({})", name, targets.len());
        if !args.targets {
            continue;
        }
        for (i, target) in targets.iter().enumerate() {
            let prefix = if i == targets.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} ({})", prefix, target.describe(), target.transport());
        }
    }

    println!("\nAggregation: {}", config.aggregation_enabled());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_lists_follow_flag() {
        let config = GatewayConfig {
            raddec_targets: vec![TargetConfig::Datagram {
                host: "collector".into(),
                port: 50001,
            }],
            ..GatewayConfig::default()
        };

        let args = InfoArgs {
            config: "gateway.toml".into(),
            json: true,
            targets: true,
        };
        let info = build_config_info(&config, &args);
        assert_eq!(info.target_lists.len(), 3);
        assert_eq!(info.target_lists[0].targets[0].destination, "udp://collector:50001");

        let args = InfoArgs {
            targets: false,
            ..args
        };
        let info = build_config_info(&config, &args);
        assert!(info.target_lists[0].targets.is_empty());
        assert_eq!(info.target_lists[0].count, 1);
    }
}
