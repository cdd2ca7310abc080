//! Command handlers.

pub mod config_cmd;
pub mod poll;
pub mod run;

use std::path::PathBuf;

use rapt_config::Config;
use rapt_core::BridgeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file selected by `--config`, or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(rapt_config::config_path)
}

pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(rapt_config::load_config_from(&config_file(global))?)
}

/// Load, validate and resolve everything a bridge needs.
pub fn bridge_config(global: &GlobalOpts) -> Result<BridgeConfig, CliError> {
    let cfg = load_config(global)?;
    let bridge = cfg.to_bridge_config().map_err(|err| match err {
        rapt_config::ConfigError::NoUsername => CliError::NoConfig {
            path: config_file(global).display().to_string(),
        },
        other => other.into(),
    })?;
    tracing::debug!(
        username = %bridge.username,
        interval_secs = bridge.poll_interval.as_secs(),
        "configuration resolved"
    );
    Ok(bridge)
}
