// RAPT list-endpoint client.
//
// Every call is a bearer-authenticated GET that returns a JSON array of
// device records for one category. Records are handed back as raw JSON
// values; interpreting fields is rapt-core's job.

use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credential;
use crate::category::DeviceCategory;
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// Async client for the RAPT device list endpoints.
pub struct RaptClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl RaptClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url: Self::normalize_base_url(base_url)?,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout_secs: 0,
        })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// Fetch every device of `category` on the account.
    pub async fn list_devices(
        &self,
        category: DeviceCategory,
        credential: &Credential,
    ) -> Result<Vec<Value>, Error> {
        let url = self.base_url.join(category.list_path())?;
        debug!(%category, "GET {url}");

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, credential.authorization())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        match status.as_u16() {
            200..=299 => {}
            401 => return Err(Error::Unauthorized),
            429 => {
                return Err(Error::RateLimited {
                    retry_after_secs: retry_after,
                });
            }
            code => {
                return Err(Error::Http {
                    status: code,
                    message: preview(&body).to_owned(),
                });
            }
        }

        trace!(%category, bytes = body.len(), "list response received");
        parse_device_list(&body)
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

/// Decode a list response. Anything other than a JSON array is malformed.
fn parse_device_list(body: &str) -> Result<Vec<Value>, Error> {
    let value: Value = serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::Deserialization {
            message: format!("expected a JSON array, got {}", kind_of(&other)),
            body: body.to_owned(),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
