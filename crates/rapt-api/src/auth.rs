// Token endpoint client and bearer credential type.
//
// RAPT issues short-lived bearer tokens through an OAuth2 password grant.
// The credential remembers when it was issued so callers can refresh it
// ahead of expiry instead of waiting for a 401.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, preview};
use crate::transport::TransportConfig;

const CLIENT_ID: &str = "rapt-user";
const GRANT_TYPE: &str = "password";

/// Lifetime and refresh policy applied to issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Used when the token response carries no `expires_in`.
    pub default_lifetime: Duration,
    /// How long before expiry the token is considered due for refresh.
    pub refresh_margin: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            default_lifetime: Duration::from_secs(50 * 60),
            refresh_margin: Duration::from_secs(5 * 60),
        }
    }
}

/// A bearer token together with its validity window.
///
/// Immutable once issued: a refresh produces a new `Credential`.
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: SecretString,
    issued_at: Instant,
    expires_at: Instant,
    refresh_at: Instant,
}

impl Credential {
    /// Build a credential issued at `issued_at` and valid for `lifetime`.
    ///
    /// `refresh_at` sits `margin` before expiry. When the lifetime is not
    /// longer than the margin it falls back to the midpoint of the window.
    pub fn new(
        access_token: SecretString,
        issued_at: Instant,
        lifetime: Duration,
        margin: Duration,
    ) -> Self {
        let expires_at = issued_at + lifetime;
        let refresh_at = if lifetime > margin {
            expires_at - margin
        } else {
            issued_at + lifetime / 2
        };
        Self {
            access_token,
            issued_at,
            expires_at,
            refresh_at,
        }
    }

    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn refresh_at(&self) -> Instant {
        self.refresh_at
    }

    /// A credential must never be sent once `now >= expires_at`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn needs_refresh(&self, now: Instant) -> bool {
        now >= self.refresh_at
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Client for the RAPT identity endpoint.
pub struct AuthClient {
    http: reqwest::Client,
    token_url: Url,
    policy: TokenPolicy,
    timeout_secs: u64,
}

impl AuthClient {
    pub fn new(
        token_url: &str,
        transport: &TransportConfig,
        policy: TokenPolicy,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            token_url: Url::parse(token_url)?,
            policy,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        token_url: &str,
        http: reqwest::Client,
        policy: TokenPolicy,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            token_url: Url::parse(token_url)?,
            policy,
            timeout_secs: 0,
        })
    }

    /// Exchange the account username and API secret for a bearer token.
    ///
    /// HTTP 400/401/403 mean the secret was refused and map to
    /// [`Error::Authentication`]. Everything else is left for the caller to
    /// classify as transient.
    pub async fn request_token(
        &self,
        username: &str,
        secret: &SecretString,
    ) -> Result<Credential, Error> {
        debug!("requesting token from {}", self.token_url);

        let form = [
            ("client_id", CLIENT_ID),
            ("grant_type", GRANT_TYPE),
            ("username", username),
            ("password", secret.expose_secret()),
        ];

        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        match status.as_u16() {
            200..=299 => {}
            400 | 401 | 403 => {
                return Err(Error::Authentication {
                    message: format!(
                        "token endpoint refused credentials (HTTP {status}): {}",
                        preview(&body)
                    ),
                });
            }
            429 => return Err(Error::RateLimited { retry_after_secs: None }),
            code => {
                return Err(Error::Http {
                    status: code,
                    message: preview(&body).to_owned(),
                });
            }
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("invalid token response: {e}"),
                body: body.clone(),
            })?;

        let Some(token) = parsed.access_token.filter(|t| !t.is_empty()) else {
            return Err(Error::Deserialization {
                message: "token response has no access_token".into(),
                body,
            });
        };

        let lifetime = parsed
            .expires_in
            .map_or(self.policy.default_lifetime, Duration::from_secs);

        info!(expires_in_secs = lifetime.as_secs(), "authenticated with RAPT API");

        Ok(Credential::new(
            SecretString::from(token),
            Instant::now(),
            lifetime,
            self.policy.refresh_margin,
        ))
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}
