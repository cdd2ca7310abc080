// rapt-core: Polling bridge between rapt-api and a host display layer.
//
// The token manager keeps a valid bearer credential, the poll coordinator
// walks every device category on a paced schedule, and the entity mapper
// turns raw device records into named, typed entity states.

pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod mapping;
pub mod model;
pub mod sink;
pub mod source;
pub mod store;
pub mod token;

mod pacing;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use coordinator::{BridgeStatus, CategoryFailure, DiscoveryEvent, PollCoordinator, PollReport};
pub use error::CoreError;
pub use sink::{DisplaySink, NullSink};
pub use source::{ApiSource, Authenticator, TelemetrySource};
pub use store::BridgeStore;
pub use token::TokenManager;

pub use model::{DeviceInfo, DeviceRecord, EntityKind, EntityState, EntityValue, Unit};
pub use rapt_api::{DEFAULT_API_BASE_URL, DEFAULT_AUTH_URL, DeviceCategory, TokenPolicy};
