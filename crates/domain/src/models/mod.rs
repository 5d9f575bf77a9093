//! Domain models for Fleet Presence.

pub mod device;
pub mod lock_event;

pub use device::{Device, LockState, NewDevice, Presence};
pub use lock_event::{LockEvent, NewLockEvent};
