//! In-memory store for tests and local development.
//!
//! Counts device writes and supports per-device write failure injection so
//! tests can verify write amplification and failure isolation.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{DeviceStore, LockEventStore, StoreError};
use crate::models::{Device, LockEvent, LockState, NewDevice, NewLockEvent, Presence};

/// In-memory implementation of the store traits.
#[derive(Default)]
pub struct MemoryStore {
    devices: RwLock<BTreeMap<i64, Device>>,
    events: RwLock<Vec<LockEvent>>,
    failing: RwLock<HashSet<i64>>,
    failing_appends: AtomicBool,
    next_device_id: AtomicI64,
    next_event_id: AtomicI64,
    device_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of device-record writes issued so far (register + put).
    pub fn device_writes(&self) -> usize {
        self.device_writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `put` for the given device fail.
    pub fn fail_writes_for(&self, device_id: i64) {
        write_guard(&self.failing).insert(device_id);
    }

    /// Make every subsequent lock event `append` fail.
    pub fn fail_event_appends(&self) {
        self.failing_appends.store(true, Ordering::SeqCst);
    }

    /// Clear all injected write failures.
    pub fn clear_write_failures(&self) {
        write_guard(&self.failing).clear();
        self.failing_appends.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Device>, StoreError> {
        Ok(read_guard(&self.devices).get(&id).cloned())
    }

    async fn get_by_token(&self, token: Uuid) -> Result<Option<Device>, StoreError> {
        Ok(read_guard(&self.devices)
            .values()
            .find(|d| d.device_token == token)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Device>, StoreError> {
        Ok(read_guard(&self.devices).values().cloned().collect())
    }

    async fn register(&self, new: NewDevice) -> Result<Device, StoreError> {
        let now = Utc::now();
        let mut devices = write_guard(&self.devices);

        let existing_id = devices
            .values()
            .find(|d| d.device_token == new.device_token)
            .map(|d| d.id);

        let device = match existing_id {
            Some(id) => {
                let device = devices.get_mut(&id).ok_or_else(|| {
                    StoreError::Unavailable("device vanished during register".into())
                })?;
                device.display_name = new.display_name;
                device.os_version = new.os_version;
                device.app_version = new.app_version;
                device.updated_at = now;
                device.clone()
            }
            None => {
                let id = self.next_device_id.fetch_add(1, Ordering::SeqCst) + 1;
                let device = Device {
                    id,
                    device_token: new.device_token,
                    display_name: new.display_name,
                    os_version: new.os_version,
                    app_version: new.app_version,
                    enabled: true,
                    presence: Presence::Offline,
                    lock_state: LockState::Unlocked,
                    last_seen_at: None,
                    created_at: now,
                    updated_at: now,
                };
                devices.insert(id, device.clone());
                device
            }
        };

        self.device_writes.fetch_add(1, Ordering::SeqCst);
        Ok(device)
    }

    async fn put(&self, device: &Device) -> Result<Device, StoreError> {
        if read_guard(&self.failing).contains(&device.id) {
            return Err(StoreError::Unavailable(format!(
                "injected write failure for device {}",
                device.id
            )));
        }

        write_guard(&self.devices).insert(device.id, device.clone());
        self.device_writes.fetch_add(1, Ordering::SeqCst);
        Ok(device.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(write_guard(&self.devices).remove(&id).is_some())
    }
}

#[async_trait]
impl LockEventStore for MemoryStore {
    async fn append(&self, event: NewLockEvent) -> Result<LockEvent, StoreError> {
        if self.failing_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected append failure".to_string(),
            ));
        }

        let id = self.next_event_id.fetch_add(1, Ordering::SeqCst) + 1;
        let event = LockEvent {
            id,
            device_id: event.device_id,
            lock_code: event.lock_code,
            locked_at: event.locked_at,
            created_at: Utc::now(),
        };
        write_guard(&self.events).push(event.clone());
        Ok(event)
    }

    async fn list_for_device(&self, device_id: i64) -> Result<Vec<LockEvent>, StoreError> {
        let mut events: Vec<LockEvent> = read_guard(&self.events)
            .iter()
            .filter(|e| e.device_id == device_id)
            .cloned()
            .collect();
        // Newest first, same ordering as the database-backed store.
        events.sort_by(|a, b| (b.locked_at, b.id).cmp(&(a.locked_at, a.id)));
        Ok(events)
    }
}

// Lock poisoning only happens after a panic in another test thread; the data
// is still usable for our purposes.
fn read_guard<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_guard<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_device(token: Uuid) -> NewDevice {
        NewDevice {
            device_token: token,
            display_name: "Shop floor handset".to_string(),
            os_version: Some("13".to_string()),
            app_version: Some("1.0.0".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_creates_unseen_offline_device() {
        let store = MemoryStore::new();
        let device = store.register(new_device(Uuid::new_v4())).await.unwrap();

        assert_eq!(device.presence, Presence::Offline);
        assert_eq!(device.lock_state, LockState::Unlocked);
        assert!(device.enabled);
        assert!(device.last_seen_at.is_none());
    }

    #[tokio::test]
    async fn test_register_same_token_updates_in_place() {
        let store = MemoryStore::new();
        let token = Uuid::new_v4();
        let first = store.register(new_device(token)).await.unwrap();

        let mut renamed = new_device(token);
        renamed.display_name = "Renamed handset".to_string();
        renamed.app_version = Some("1.1.0".to_string());
        let second = store.register(renamed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name, "Renamed handset");
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_token() {
        let store = MemoryStore::new();
        let token = Uuid::new_v4();
        store.register(new_device(token)).await.unwrap();

        assert!(store.get_by_token(token).await.unwrap().is_some());
        assert!(store.get_by_token(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_counts_writes() {
        let store = MemoryStore::new();
        let device = store.register(new_device(Uuid::new_v4())).await.unwrap();
        let before = store.device_writes();

        store.put(&device).await.unwrap();
        store.put(&device).await.unwrap();

        assert_eq!(store.device_writes(), before + 2);
    }

    #[tokio::test]
    async fn test_injected_failure_rejects_put() {
        let store = MemoryStore::new();
        let device = store.register(new_device(Uuid::new_v4())).await.unwrap();

        store.fail_writes_for(device.id);
        assert!(store.put(&device).await.is_err());

        store.clear_write_failures();
        assert!(store.put(&device).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_failure_rejects_append() {
        let store = MemoryStore::new();
        let device = store.register(new_device(Uuid::new_v4())).await.unwrap();
        let event = NewLockEvent {
            device_id: device.id,
            lock_code: "123456".to_string(),
            locked_at: Utc::now(),
        };

        store.fail_event_appends();
        assert!(store.append(event.clone()).await.is_err());

        store.clear_write_failures();
        assert!(store.append(event).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let store = MemoryStore::new();
        let device = store.register(new_device(Uuid::new_v4())).await.unwrap();

        assert!(store.delete(device.id).await.unwrap());
        assert!(!store.delete(device.id).await.unwrap());
        assert!(store.get(device.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lock_events_survive_device_deletion() {
        let store = MemoryStore::new();
        let device = store.register(new_device(Uuid::new_v4())).await.unwrap();

        store
            .append(NewLockEvent {
                device_id: device.id,
                lock_code: "123456".to_string(),
                locked_at: Utc::now(),
            })
            .await
            .unwrap();
        store.delete(device.id).await.unwrap();

        let events = store.list_for_device(device.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].lock_code, "123456");
    }
}
