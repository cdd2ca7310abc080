// ── Runtime bridge configuration ──
//
// Describes how to reach the RAPT API and how aggressively to poll it.
// Carries the account secret but never touches disk: rapt-config builds
// a `BridgeConfig` and hands it in.

use std::time::Duration;

use rapt_api::{DEFAULT_API_BASE_URL, DEFAULT_AUTH_URL, TokenPolicy, TransportConfig};
use secrecy::SecretString;

/// Everything a bridge instance needs to run.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// RAPT account e-mail.
    pub username: String,
    /// API secret generated in the RAPT portal.
    pub api_secret: SecretString,
    pub auth_url: String,
    pub api_base_url: String,
    /// Scheduled cycle period.
    pub poll_interval: Duration,
    /// Minimum gap between two list requests, also across cycles.
    pub request_spacing: Duration,
    /// Consecutive fully-failed cycles before the bridge reports unavailable.
    pub failure_threshold: u32,
    pub token_policy: TokenPolicy,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl BridgeConfig {
    /// Production endpoints with the default polling discipline.
    pub fn new(username: impl Into<String>, api_secret: SecretString) -> Self {
        Self {
            username: username.into(),
            api_secret,
            auth_url: DEFAULT_AUTH_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            poll_interval: Duration::from_secs(60),
            request_spacing: Duration::from_secs(15),
            failure_threshold: 3,
            token_policy: TokenPolicy::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(self.timeout)
    }
}
