// rapt-api: Async read-only client for the RAPT cloud telemetry API.
//
// Two endpoint shapes are consumed: the OAuth token endpoint and the
// per-category device list endpoints. No write/control endpoint exists
// in this crate.

pub mod auth;
pub mod category;
pub mod client;
pub mod error;
pub mod transport;

pub use auth::{AuthClient, Credential, TokenPolicy};
pub use category::DeviceCategory;
pub use client::RaptClient;
pub use error::Error;
pub use transport::TransportConfig;

/// Production token endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://id.rapt.io/connect/token";

/// Production REST base URL (list endpoints are joined onto this).
pub const DEFAULT_API_BASE_URL: &str = "https://api.rapt.io/api";
