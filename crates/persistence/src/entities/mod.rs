//! Entity definitions (database row mappings).

mod device;
mod lock_event;

pub use device::DeviceEntity;
pub use lock_event::LockEventEntity;
