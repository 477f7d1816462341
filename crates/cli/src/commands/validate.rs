//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{GatewayConfig, TargetConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    raddec_target_count: usize,
    proximity_target_count: usize,
    digest_target_count: usize,
    aggregation: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    raddec_target_count: config.raddec_targets.len(),
                    proximity_target_count: config.proximity_targets.len(),
                    digest_target_count: config.digest_targets.len(),
                    aggregation: config.aggregation_enabled(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &GatewayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.raddec_targets.is_empty() && !config.aggregation_enabled() {
        warnings.push("No targets configured - events will be dropped".to_string());
    }

    if config.document_store.is_some() && !config.uses_document_store() {
        warnings.push("[document_store] is set but no target uses it".to_string());
    }

    for (list, targets) in config.target_lists() {
        for (index, target) in targets.iter().enumerate() {
            if targets[..index].contains(target) && *target != TargetConfig::DocumentStore {
                warnings.push(format!(
                    "{list}[{index}] duplicates an earlier target ({})",
                    target.describe()
                ));
            }
        }
        if targets
            .iter()
            .filter(|t| **t == TargetConfig::DocumentStore)
            .count()
            > 1
        {
            warnings.push(format!(
                "{list} lists the document store more than once - later creates will be rejected as duplicates"
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Raddec targets: {}", summary.raddec_target_count);
            println!("  Proximity targets: {}", summary.proximity_target_count);
            println!("  Digest targets: {}", summary.digest_target_count);
            println!("  Aggregation: {}", summary.aggregation);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webhook(host: &str) -> TargetConfig {
        TargetConfig::Webhook {
            host: host.into(),
            port: 80,
            path: None,
            use_tls: false,
        }
    }

    #[test]
    fn test_warnings() {
        assert_eq!(collect_warnings(&GatewayConfig::default()).len(), 1);

        let config = GatewayConfig {
            raddec_targets: vec![webhook("a"), webhook("a"), webhook("b")],
            ..GatewayConfig::default()
        };
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("raddec_targets[1]"));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "does-not-exist.toml".into(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
