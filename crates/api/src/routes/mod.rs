//! HTTP endpoint handlers.

pub mod devices;
pub mod health;
pub mod lock_events;
