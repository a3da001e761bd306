//! Config validation
//!
//! Rules:
//! - field-level constraints declared on the config types (url, ranges)
//! - site.base_url uses http or https
//! - dispatch.interval_secs is finite and > 0
//! - file hook has an output path

use contracts::{ContractError, HookKind, RelayConfig};
use ::validator::Validate;

/// Validate a RelayConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_site(config)?;
    validate_dispatch(config)?;
    validate_hook(config)?;
    Ok(())
}

/// Declarative constraints from the `validator` derive
fn validate_fields(config: &RelayConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("config", e.to_string()))
}

fn validate_site(config: &RelayConfig) -> Result<(), ContractError> {
    let url = config.site.base_url.to_lowercase();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "site.base_url",
            format!("expected an http(s) URL, got '{}'", config.site.base_url),
        ));
    }
    Ok(())
}

fn validate_dispatch(config: &RelayConfig) -> Result<(), ContractError> {
    let interval = config.dispatch.interval_secs;
    if !interval.is_finite() || interval <= 0.0 {
        return Err(ContractError::config_validation(
            "dispatch.interval_secs",
            format!("interval_secs must be > 0, got {interval}"),
        ));
    }
    Ok(())
}

fn validate_hook(config: &RelayConfig) -> Result<(), ContractError> {
    if config.hook.kind == HookKind::File && config.hook.path.is_none() {
        return Err(ContractError::config_validation(
            "hook.path",
            "file hook requires a path",
        ));
    }
    Ok(())
}
