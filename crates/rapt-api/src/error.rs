use thiserror::Error;

/// Top-level error type for the `rapt-api` crate.
///
/// Covers the token endpoint, the list endpoints, and the transport
/// underneath both. `rapt-core` maps these into its poll-level taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The token endpoint rejected the configured username/secret.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A data endpoint rejected the bearer token (HTTP 401).
    #[error("Bearer token rejected by the API")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Responses ───────────────────────────────────────────────────
    /// Rate limited by the API (HTTP 429).
    #[error("Rate limited by the RAPT API")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// JSON body could not be decoded into the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the token endpoint refused the credentials.
    /// Retrying with the same secret will not help.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if a data endpoint refused the bearer token.
    pub fn is_token_rejected(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns `true` if this is a transient error worth retrying next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the response body did not have the expected shape.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Trim a response body for inclusion in an error message.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
