//! Config subcommand handlers.

use rapt_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{config_file, load_config};

/// Format config for display, masking the plaintext secret.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "[account]");
    if let Some(ref u) = cfg.account.username {
        let _ = writeln!(out, "username = \"{u}\"");
    }
    if cfg.account.api_secret.is_some() {
        let _ = writeln!(out, "api_secret = \"****\"");
    }
    if let Some(ref env) = cfg.account.api_secret_env {
        let _ = writeln!(out, "api_secret_env = \"{env}\"");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[polling]");
    let _ = writeln!(out, "interval_secs = {}", cfg.polling.interval_secs);
    let _ = writeln!(out, "request_spacing_secs = {}", cfg.polling.request_spacing_secs);
    let _ = writeln!(out, "failure_threshold = {}", cfg.polling.failure_threshold);

    let _ = writeln!(out);
    let _ = writeln!(out, "[auth]");
    let _ = writeln!(out, "refresh_margin_secs = {}", cfg.auth.refresh_margin_secs);
    let _ = writeln!(out, "token_lifetime_secs = {}", cfg.auth.token_lifetime_secs);

    let _ = writeln!(out);
    let _ = writeln!(out, "[http]");
    let _ = writeln!(out, "timeout_secs = {}", cfg.http.timeout_secs);
    let _ = writeln!(out, "api_base_url = \"{}\"", cfg.http.api_base_url);
    let _ = write!(out, "auth_url = \"{}\"", cfg.http.auth_url);

    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config_file(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = load_config(global)?;
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::SetSecret { username } => {
            let username = match username {
                Some(u) => u,
                None => load_config(global)?.username()?.to_owned(),
            };

            let secret = rpassword::prompt_password(format!("API secret for {username}: "))?;
            if secret.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "api_secret".into(),
                    reason: "secret cannot be empty".into(),
                });
            }

            rapt_config::store_api_secret(&username, secret.trim())?;
            if !global.quiet {
                eprintln!("✓ API secret for {username} stored in system keyring");
            }
            Ok(())
        }
    }
}
