//! Console display sink used by `rapt-bridge run`.
//!
//! Table mode prints one line per event, JSON modes print one compact
//! object per line so the stream can be piped into `jq`.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use rapt_core::{BridgeStatus, DeviceInfo, DiscoveryEvent, DisplaySink, EntityState};
use serde_json::json;

use crate::cli::OutputFormat;

pub struct ConsoleSink {
    json: bool,
    no_color: bool,
}

impl ConsoleSink {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self {
            json: format != OutputFormat::Table,
            no_color,
        }
    }
}

fn emit(line: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
}

impl DisplaySink for ConsoleSink {
    fn register_device(&self, event: &DiscoveryEvent) {
        if self.json {
            emit(&json!({"event": "discovered", "device": event.device}).to_string());
            return;
        }
        let device = &event.device;
        let label = format!("{} ({}, {})", device.name, device.category, device.device_id);
        if self.no_color {
            emit(&format!("+ {label}"));
        } else {
            emit(&format!("{} {}", "+".green().bold(), label.bold()));
        }
    }

    fn upsert(&self, device: &DeviceInfo, entity: &EntityState) {
        if self.json {
            emit(&json!({"event": "state", "device": device.name, "entity": entity}).to_string());
            return;
        }
        let value = entity.display_value();
        let line = format!("{:<40} {value}", entity.key);
        if self.no_color {
            let marker = if entity.stale { " (stale)" } else { "" };
            emit(&format!("{line}{marker}"));
        } else if entity.stale {
            emit(&format!("{}", line.dimmed()));
        } else if entity.value.is_unknown() {
            emit(&format!("{:<40} {}", entity.key, value.dimmed()));
        } else {
            emit(&format!("{:<40} {}", entity.key, value.cyan()));
        }
    }

    fn status_changed(&self, status: BridgeStatus) {
        if self.json {
            emit(&json!({"event": "status", "status": status}).to_string());
            return;
        }
        let label = status.to_string();
        if self.no_color {
            emit(&format!("status: {label}"));
            return;
        }
        let colored = match status {
            BridgeStatus::Available => label.green().to_string(),
            BridgeStatus::PartiallyDegraded => label.yellow().to_string(),
            BridgeStatus::Unavailable => label.red().to_string(),
            BridgeStatus::Idle | BridgeStatus::Polling => label.dimmed().to_string(),
        };
        emit(&format!("status: {colored}"));
    }
}
