//! `run` command implementation.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::cli::RunArgs;
use crate::gateway::{Gateway, GatewayOptions, RaddecInput};

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        raddec_targets = config.raddec_targets.len(),
        proximity_targets = config.proximity_targets.len(),
        digest_targets = config.digest_targets.len(),
        debug = config.gateway.debug,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let input = match (&args.input, args.mock_rate) {
        (_, Some(rate)) if rate > 0.0 => RaddecInput::Mock(rate),
        (_, Some(rate)) => anyhow::bail!("--mock-rate must be positive, got {rate}"),
        (Some(path), None) => RaddecInput::JsonLines(path.clone()),
        (None, None) => RaddecInput::JsonLines(PathBuf::from("-")),
    };

    let gateway = Gateway::new(GatewayOptions {
        config,
        input,
        derived_input: args.derived_input.clone(),
        aggregator_output: args.aggregator_output.clone(),
        buffer_size: args.buffer_size.max(1),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    info!("Starting relay...");

    let stats = gateway
        .run(setup_shutdown_signal())
        .await
        .context("Relay execution failed")?;

    info!(
        raddecs = stats.raddecs_received,
        derived = stats.derived_received,
        errors = stats.errors_recorded,
        failed_sends = stats.total_failed(),
        "Relay finished"
    );
    stats.print_summary();

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::GatewayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Gateway:");
    println!("  UDP broadcast: {}", config.gateway.udp_broadcast);
    println!("  Debug: {}", config.gateway.debug);
    println!(
        "  Encoding: timestamp={}, packets={}",
        config.encoding.include_timestamp, config.encoding.include_packets
    );

    for (list, targets) in config.target_lists() {
        if targets.is_empty() {
            continue;
        }
        println!("\n{} ({}):", list, targets.len());
        for target in targets {
            println!("  - {} ({})", target.describe(), target.transport());
        }
    }

    if let Some(store) = &config.document_store {
        println!("\nDocument store: {}", store.node);
    }

    println!();
}
