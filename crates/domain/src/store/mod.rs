//! Record store contract.
//!
//! All three write paths (presence updates, lock transitions, the heartbeat
//! sweep) converge on the same store. The contract requires single-record
//! write atomicity so that last-write-wins per device is well-defined; no
//! cross-device transaction is assumed.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Device, LockEvent, NewDevice, NewLockEvent};

pub mod memory;

pub use memory::MemoryStore;

/// Transient or I/O failure in the record store.
///
/// "Not found" is not an error at this layer; lookups return `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("conflicting write: {0}")]
    Conflict(String),
}

/// Durable storage of device records.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Fetch a device by internal id.
    async fn get(&self, id: i64) -> Result<Option<Device>, StoreError>;

    /// Fetch a device by its external stable token.
    async fn get_by_token(&self, token: Uuid) -> Result<Option<Device>, StoreError>;

    /// Fetch the full device set, ordered by id.
    async fn list_all(&self) -> Result<Vec<Device>, StoreError>;

    /// Create a device, or refresh its registered fields if the token is
    /// already known. Does not touch `last_seen_at`.
    async fn register(&self, new: NewDevice) -> Result<Device, StoreError>;

    /// Write a full device record (upsert on id, last-write-wins).
    async fn put(&self, device: &Device) -> Result<Device, StoreError>;

    /// Remove a device record. Returns `false` if it was already absent.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// Append-only audit trail of lock actions.
#[async_trait]
pub trait LockEventStore: Send + Sync {
    async fn append(&self, event: NewLockEvent) -> Result<LockEvent, StoreError>;

    async fn list_for_device(&self, device_id: i64) -> Result<Vec<LockEvent>, StoreError>;
}
