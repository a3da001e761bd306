//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{HookKind, RelayConfig, DISPATCH_BATCH_SIZE};

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
    site: String,
    has_user: bool,
    workers: usize,
    interval_secs: f64,
    batch_size: usize,
    hook: String,
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
                    site: config.site.base_url.clone(),
                    has_user: config.site.user.is_some(),
                    workers: config.dispatch.workers,
                    interval_secs: config.dispatch.interval().as_secs_f64(),
                    batch_size: config.dispatch.effective_batch_size(),
                    hook: format!("{:?}", config.hook.kind),
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
fn collect_warnings(config: &RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.site.user.is_none() {
        warnings.push("site.user is not set - dispatch will not start".to_string());
    }

    if config.site.session_token.is_empty() {
        warnings.push("site.session_token is empty - every post will fail".to_string());
    }

    if config.dispatch.batch_size < DISPATCH_BATCH_SIZE {
        warnings.push(format!(
            "dispatch.batch_size is {} - the site accepts up to {} events per request",
            config.dispatch.batch_size, DISPATCH_BATCH_SIZE
        ));
    }

    if config.hook.kind == HookKind::None {
        warnings.push("hook.kind is none - dispatched batches are not recorded".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Site: {}", summary.site);
            println!("  User: {}", if summary.has_user { "set" } else { "none" });
            println!("  Workers: {}", summary.workers);
            println!("  Interval: {:.2}s", summary.interval_secs);
            println!("  Batch size: {}", summary.batch_size);
            println!("  Hook: {}", summary.hook);
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
