// ── Domain model ──

mod device;
mod entity;

pub use device::{DeviceInfo, DeviceRecord};
pub use entity::{EntityKind, EntityState, EntityValue, Unit};
