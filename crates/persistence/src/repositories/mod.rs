//! Repository implementations of the domain store traits.

mod device;
mod lock_event;

pub use device::DeviceRepository;
pub use lock_event::LockEventRepository;
