// ── Display sink ──
//
// The host display layer as seen from the bridge. Implementations must
// not block: they are called from the poll task.

use crate::coordinator::{BridgeStatus, DiscoveryEvent};
use crate::model::{DeviceInfo, EntityState};

pub trait DisplaySink: Send + Sync {
    /// A device was seen for the first time. Called before its entities
    /// are upserted.
    fn register_device(&self, event: &DiscoveryEvent);

    fn upsert(&self, device: &DeviceInfo, entity: &EntityState);

    fn status_changed(&self, status: BridgeStatus);
}

/// Discards everything. For one-shot callers that read the poll report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn register_device(&self, _event: &DiscoveryEvent) {}

    fn upsert(&self, _device: &DeviceInfo, _entity: &EntityState) {}

    fn status_changed(&self, _status: BridgeStatus) {}
}
