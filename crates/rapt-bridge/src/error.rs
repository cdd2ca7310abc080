//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use rapt_config::ConfigError;
use rapt_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFIG: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("RAPT rejected the API secret")]
    #[diagnostic(
        code(rapt::auth_failed),
        help(
            "Generate a new API secret in the RAPT portal (My Account > API Secrets),\n\
             then run: rapt-bridge config set-secret"
        )
    )]
    AuthFailed { message: String },

    #[error("No API secret found for '{username}'")]
    #[diagnostic(
        code(rapt::no_secret),
        help(
            "Store one with: rapt-bridge config set-secret\n\
             Or set the RAPT_API_SECRET environment variable."
        )
    )]
    NoSecret { username: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("RAPT cloud unreachable: {message}")]
    #[diagnostic(
        code(rapt::unavailable),
        help("Check network access to api.rapt.io and retry. Use -vv to see each request.")
    )]
    Unavailable { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No RAPT account configured")]
    #[diagnostic(
        code(rapt::no_config),
        help(
            "Set account.username in {path}\n\
             Or set RAPT_ACCOUNT__USERNAME."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(rapt::config))]
    Config(ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rapt::validation))]
    Validation { field: String, reason: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Interrupted")]
    #[diagnostic(code(rapt::cancelled))]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(rapt::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoSecret { .. } => exit_code::AUTH,
            Self::Unavailable { .. } => exit_code::CONNECTION,
            Self::NoConfig { .. } | Self::Config(_) => exit_code::CONFIG,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Cancelled | Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── Layer conversions ────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Cancelled => Self::Cancelled,
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            other => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoSecret { username } => Self::NoSecret { username },
            ConfigError::NoUsername => Self::NoConfig {
                path: rapt_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
