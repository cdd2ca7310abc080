// ── Core error types ──
//
// Poll-level errors. Consumers never see HTTP status codes directly:
// `rapt_api::Error` values are classified into the four kinds the
// coordinator acts on (fatal auth, transient auth, transient network,
// malformed payload).

use rapt_api::DeviceCategory;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    /// The token endpoint rejected the configured secret. Non-retryable.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Token request failed for a reason worth retrying next cycle.
    #[error("Token request failed: {message}")]
    TransientAuth { message: String },

    // ── Polling ──────────────────────────────────────────────────────
    #[error("Request failed: {message}")]
    TransientNetwork { message: String },

    #[error("Malformed {category} payload: {message}")]
    MalformedPayload {
        category: DeviceCategory,
        message: String,
    },

    /// Every category failed in one cycle.
    #[error("Poll cycle failed for all {failed} device categories")]
    CycleFailed { failed: usize },

    #[error("Poll cancelled by shutdown")]
    Cancelled,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if retrying on the next cycle may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientAuth { .. } | Self::TransientNetwork { .. } | Self::CycleFailed { .. }
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. } | Self::Config { .. })
    }

    /// Classify a token endpoint failure.
    pub(crate) fn from_auth(err: rapt_api::Error) -> Self {
        if err.is_auth_rejected() {
            Self::AuthenticationFailed {
                message: err.to_string(),
            }
        } else {
            Self::TransientAuth {
                message: err.to_string(),
            }
        }
    }

    /// Classify a list endpoint failure for `category`.
    pub(crate) fn from_list(category: DeviceCategory, err: rapt_api::Error) -> Self {
        if err.is_malformed() {
            Self::MalformedPayload {
                category,
                message: err.to_string(),
            }
        } else {
            Self::TransientNetwork {
                message: err.to_string(),
            }
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rapt_api::Error> for CoreError {
    fn from(err: rapt_api::Error) -> Self {
        match err {
            rapt_api::Error::Authentication { message } => Self::AuthenticationFailed { message },
            rapt_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid URL: {e}"),
            },
            rapt_api::Error::ClientBuild(message) => Self::Config { message },
            other => Self::TransientNetwork {
                message: other.to_string(),
            },
        }
    }
}
