//! `run`: long-lived bridge printing every update until Ctrl-C.

use std::sync::Arc;

use rapt_core::Bridge;
use tracing::info;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;
use crate::sink::ConsoleSink;

use super::bridge_config;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = bridge_config(global)?;
    let sink = Arc::new(ConsoleSink::new(
        global.output,
        !output::should_color(global.color),
    ));
    let bridge = Bridge::connect(&config, sink)?;

    bridge.start().await?;
    info!("bridge running, press Ctrl-C to stop");

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.map_err(CliError::from),
        // Only a rejected secret stops the bridge from the inside.
        () = bridge.stopped() => Err(CliError::AuthFailed {
            message: "API secret rejected while running".into(),
        }),
    };

    bridge.stop().await;
    info!("bridge stopped");
    outcome
}
