//! Business services: fleet state transitions and the deferred unlock timer.

pub mod fleet;
pub mod unlock_scheduler;

pub use fleet::FleetService;
pub use unlock_scheduler::{UnlockScheduler, AUTO_UNLOCK_DELAY};
