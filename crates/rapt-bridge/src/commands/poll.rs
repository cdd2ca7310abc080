//! One-shot `poll` and `discover` handlers.

use std::sync::Arc;

use rapt_core::{Bridge, DeviceInfo, EntityState, NullSink, PollReport};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::bridge_config;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Kind")]
    kind: String,
}

impl From<&EntityState> for EntityRow {
    fn from(e: &EntityState) -> Self {
        Self {
            key: e.key.clone(),
            name: e.name.clone(),
            value: e.display_value(),
            kind: e.kind.to_string(),
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Connection")]
    connection: String,
}

impl From<&DeviceInfo> for DeviceRow {
    fn from(d: &DeviceInfo) -> Self {
        Self {
            id: d.device_id.clone(),
            category: d.category.to_string(),
            name: d.name.clone(),
            firmware: d.firmware_version.clone().unwrap_or_default(),
            connection: d.connection_state.clone().unwrap_or_default(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn run_cycle(global: &GlobalOpts) -> Result<PollReport, CliError> {
    let config = bridge_config(global)?;
    let bridge = Bridge::connect(&config, Arc::new(NullSink))?;
    let report = bridge.poll_now().await?;
    for failure in &report.failures {
        tracing::warn!(category = %failure.category, error = %failure.error, "category skipped");
    }
    Ok(report)
}

/// Print every entity produced by one cycle.
pub async fn handle_poll(global: &GlobalOpts) -> Result<(), CliError> {
    let report = run_cycle(global).await?;
    let out = output::render(global.output, &report, |r| {
        r.updated.iter().map(EntityRow::from).collect()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print the devices a forced discovery found.
pub async fn handle_discover(global: &GlobalOpts) -> Result<(), CliError> {
    let report = run_cycle(global).await?;
    let devices: Vec<DeviceInfo> = report.discovered.into_iter().map(|e| e.device).collect();
    let out = output::render(global.output, &devices, |d| {
        d.iter().map(DeviceRow::from).collect()
    })?;
    output::print_output(&out, global.quiet);
    if devices.is_empty() && !global.quiet {
        eprintln!("No RAPT devices found on this account.");
    }
    Ok(())
}
