// Shared transport configuration for building reqwest::Client instances.
//
// The token client and the list client share timeout and user-agent
// settings through this module.

use std::time::Duration;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. A timed-out request fails only that request.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("rapt-bridge/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }

    pub(crate) fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}
