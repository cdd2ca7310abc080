// ── Telemetry source seam ──
//
// The coordinator talks to the cloud only through these two traits, so
// the poll algorithm can be driven by a scripted source under a paused
// clock. `ApiSource` is the production implementation over rapt-api.

use std::future::Future;
use std::sync::Arc;

use rapt_api::{AuthClient, Credential, DeviceCategory, RaptClient};
use secrecy::SecretString;
use serde_json::Value;

use crate::config::BridgeConfig;
use crate::error::CoreError;

/// Issues bearer credentials.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self) -> impl Future<Output = Result<Credential, rapt_api::Error>> + Send;
}

/// Read-only access to the per-category list endpoints.
///
/// There is deliberately no write method: the bridge only ever reads.
pub trait TelemetrySource: Authenticator {
    fn list_devices(
        &self,
        category: DeviceCategory,
        credential: &Credential,
    ) -> impl Future<Output = Result<Vec<Value>, rapt_api::Error>> + Send;
}

/// Production source backed by the RAPT HTTP API.
pub struct ApiSource {
    auth: AuthClient,
    client: RaptClient,
    username: String,
    secret: SecretString,
}

impl ApiSource {
    pub fn new(config: &BridgeConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        Ok(Self {
            auth: AuthClient::new(&config.auth_url, &transport, config.token_policy)?,
            client: RaptClient::new(&config.api_base_url, &transport)?,
            username: config.username.clone(),
            secret: config.api_secret.clone(),
        })
    }
}

impl Authenticator for ApiSource {
    fn authenticate(&self) -> impl Future<Output = Result<Credential, rapt_api::Error>> + Send {
        self.auth.request_token(&self.username, &self.secret)
    }
}

impl TelemetrySource for ApiSource {
    fn list_devices(
        &self,
        category: DeviceCategory,
        credential: &Credential,
    ) -> impl Future<Output = Result<Vec<Value>, rapt_api::Error>> + Send {
        self.client.list_devices(category, credential)
    }
}

impl<T: Authenticator> Authenticator for Arc<T> {
    fn authenticate(&self) -> impl Future<Output = Result<Credential, rapt_api::Error>> + Send {
        (**self).authenticate()
    }
}

impl<T: TelemetrySource> TelemetrySource for Arc<T> {
    fn list_devices(
        &self,
        category: DeviceCategory,
        credential: &Credential,
    ) -> impl Future<Output = Result<Vec<Value>, rapt_api::Error>> + Send {
        (**self).list_devices(category, credential)
    }
}
