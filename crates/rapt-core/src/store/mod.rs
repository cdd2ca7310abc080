// ── Bridge store ──
//
// Last known device records, device metadata and entity states. Written
// only by the poll coordinator, read by anyone holding the bridge.

mod collection;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{DeviceInfo, DeviceRecord, EntityState};
use collection::EntityCollection;

/// One device's worth of freshly mapped data.
#[derive(Debug, Clone)]
pub(crate) struct DeviceUpdate {
    pub(crate) record: DeviceRecord,
    pub(crate) info: DeviceInfo,
    pub(crate) entities: Vec<EntityState>,
}

pub struct BridgeStore {
    records: EntityCollection<DeviceRecord>,
    devices: EntityCollection<DeviceInfo>,
    entities: EntityCollection<EntityState>,
    last_success: watch::Sender<Option<DateTime<Utc>>>,
}

impl BridgeStore {
    pub fn new() -> Self {
        let (last_success, _) = watch::channel(None);
        Self {
            records: EntityCollection::new(),
            devices: EntityCollection::new(),
            entities: EntityCollection::new(),
            last_success,
        }
    }

    /// Commit a batch of devices, publishing each collection once.
    /// Entities not in `updates` keep their last value.
    pub(crate) fn apply(&self, updates: Vec<DeviceUpdate>) {
        let mut records = Vec::with_capacity(updates.len());
        let mut devices = Vec::with_capacity(updates.len());
        let mut entities = Vec::new();
        for DeviceUpdate {
            record,
            info,
            entities: states,
        } in updates
        {
            records.push((record.device_id.clone(), record));
            devices.push((info.device_id.clone(), info));
            entities.extend(states.into_iter().map(|e| (e.key.clone(), e)));
        }
        self.records.upsert_many(records);
        self.devices.upsert_many(devices);
        self.entities.upsert_many(entities);
    }

    /// Flag every entity as stale. Returns how many changed.
    pub(crate) fn mark_stale(&self) -> usize {
        self.entities.update_all(|e| !std::mem::replace(&mut e.stale, true))
    }

    pub(crate) fn record_success(&self) {
        self.last_success.send_replace(Some(Utc::now()));
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn device(&self, device_id: &str) -> Option<Arc<DeviceInfo>> {
        self.devices.get(device_id)
    }

    pub fn record(&self, device_id: &str) -> Option<Arc<DeviceRecord>> {
        self.records.get(device_id)
    }

    pub fn entity(&self, key: &str) -> Option<Arc<EntityState>> {
        self.entities.get(key)
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<DeviceInfo>>> {
        self.devices.snapshot()
    }

    pub fn entities_snapshot(&self) -> Arc<Vec<Arc<EntityState>>> {
        self.entities.snapshot()
    }

    /// Bumped once per committed batch or stale sweep.
    pub fn entities_version(&self) -> u64 {
        self.entities.version()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Wall-clock time of the last cycle in which any category succeeded.
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        *self.last_success.borrow()
    }
}

impl Default for BridgeStore {
    fn default() -> Self {
        Self::new()
    }
}
