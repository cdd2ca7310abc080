//! Configuration for the RAPT bridge.
//!
//! A single TOML file (account, polling, auth and HTTP sections) layered
//! under `RAPT_` environment overrides, API secret resolution
//! (env + keyring + plaintext), and translation to
//! `rapt_core::BridgeConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use rapt_core::{BridgeConfig, TokenPolicy};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keyring service name the API secret is stored under.
pub const KEYRING_SERVICE: &str = "rapt-bridge";

/// Environment variable consulted when no `api_secret_env` is named.
pub const SECRET_ENV: &str = "RAPT_API_SECRET";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no RAPT account username configured")]
    NoUsername,

    #[error("no API secret found for '{username}'")]
    NoSecret { username: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub account: Account,

    #[serde(default)]
    pub polling: Polling,

    #[serde(default)]
    pub auth: Auth,

    #[serde(default)]
    pub http: Http,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Account {
    /// RAPT portal login e-mail.
    pub username: Option<String>,

    /// API secret (plaintext, prefer keyring or env var).
    pub api_secret: Option<String>,

    /// Environment variable name containing the API secret.
    pub api_secret_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Polling {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Minimum gap between two list requests.
    #[serde(default = "default_spacing")]
    pub request_spacing_secs: u64,

    /// Fully failed cycles in a row before the bridge goes unavailable.
    #[serde(default = "default_threshold")]
    pub failure_threshold: u32,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            request_spacing_secs: default_spacing(),
            failure_threshold: default_threshold(),
        }
    }
}

fn default_interval() -> u64 {
    60
}
fn default_spacing() -> u64 {
    15
}
fn default_threshold() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Auth {
    #[serde(default = "default_margin")]
    pub refresh_margin_secs: u64,

    /// Assumed lifetime when the token response carries none.
    #[serde(default = "default_lifetime")]
    pub token_lifetime_secs: u64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            refresh_margin_secs: default_margin(),
            token_lifetime_secs: default_lifetime(),
        }
    }
}

fn default_margin() -> u64 {
    300
}
fn default_lifetime() -> u64 {
    3000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Http {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_auth_url")]
    pub auth_url: String,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            api_base_url: default_api_base_url(),
            auth_url: default_auth_url(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_api_base_url() -> String {
    rapt_core::DEFAULT_API_BASE_URL.into()
}
fn default_auth_url() -> String {
    rapt_core::DEFAULT_AUTH_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "rapt", "rapt-bridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rapt-bridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields defaults.
///
/// Environment keys use `__` between section and field, e.g.
/// `RAPT_POLLING__INTERVAL_SECS=120`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RAPT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secret resolution ───────────────────────────────────────────────

/// Resolve the API secret from the credential chain.
pub fn resolve_api_secret(account: &Account, username: &str) -> Result<SecretString, ConfigError> {
    resolve_api_secret_with(
        account,
        username,
        |name| std::env::var(name).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// Chain order: `api_secret_env` → `RAPT_API_SECRET` → keyring → plaintext.
fn resolve_api_secret_with(
    account: &Account,
    username: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(val) = account.api_secret_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. Well-known env var
    if let Some(val) = env(SECRET_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring(username) {
        return Ok(SecretString::from(secret));
    }

    // 4. Plaintext in config
    if let Some(ref secret) = account.api_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoSecret {
        username: username.into(),
    })
}

/// Store the API secret in the system keyring.
pub fn store_api_secret(username: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, username)?;
    entry.set_password(secret)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Range and URL checks that do not need the secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_secs == 0 {
            return Err(invalid("polling.interval_secs", "must be at least 1"));
        }
        if self.polling.failure_threshold == 0 {
            return Err(invalid("polling.failure_threshold", "must be at least 1"));
        }
        if self.auth.refresh_margin_secs >= self.auth.token_lifetime_secs {
            return Err(invalid(
                "auth.refresh_margin_secs",
                "must be shorter than auth.token_lifetime_secs",
            ));
        }
        for (field, raw) in [
            ("http.api_base_url", &self.http.api_base_url),
            ("http.auth_url", &self.http.auth_url),
        ] {
            if url::Url::parse(raw).is_err() {
                return Err(invalid(field, &format!("invalid URL: {raw}")));
            }
        }
        Ok(())
    }

    pub fn username(&self) -> Result<&str, ConfigError> {
        self.account
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::NoUsername)
    }

    /// Build a `BridgeConfig`, resolving the secret through the chain.
    pub fn to_bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        self.validate()?;
        let username = self.username()?;
        let secret = resolve_api_secret(&self.account, username)?;
        self.bridge_config_with_secret(secret)
    }

    /// Build a `BridgeConfig` around an already-resolved secret.
    pub fn bridge_config_with_secret(
        &self,
        secret: SecretString,
    ) -> Result<BridgeConfig, ConfigError> {
        self.validate()?;
        let username = self.username()?;

        let mut bridge = BridgeConfig::new(username, secret);
        bridge.auth_url.clone_from(&self.http.auth_url);
        bridge.api_base_url.clone_from(&self.http.api_base_url);
        bridge.poll_interval = Duration::from_secs(self.polling.interval_secs);
        bridge.request_spacing = Duration::from_secs(self.polling.request_spacing_secs);
        bridge.failure_threshold = self.polling.failure_threshold;
        bridge.token_policy = TokenPolicy {
            default_lifetime: Duration::from_secs(self.auth.token_lifetime_secs),
            refresh_margin: Duration::from_secs(self.auth.refresh_margin_secs),
        };
        bridge.timeout = Duration::from_secs(self.http.timeout_secs);
        Ok(bridge)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}
