//! Common fixtures for integration tests.
//!
//! These tests drive the service layer over the in-memory store so that
//! timer and sweep behavior can be exercised on a paused tokio clock.

// Helper utilities shared across integration test binaries; not every test
// uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fake::faker::company::en::Buzzword;
use fake::Fake;
use uuid::Uuid;

use domain::models::{Device, NewDevice};
use domain::store::{DeviceStore, LockEventStore, MemoryStore};
use fleet_presence_api::jobs::OfflineSweepJob;
use fleet_presence_api::services::{FleetService, UnlockScheduler, AUTO_UNLOCK_DELAY};

/// A fleet service wired over a single in-memory store, with direct handles
/// to the store and the unlock scheduler for assertions.
pub struct TestFleet {
    pub store: Arc<MemoryStore>,
    pub fleet: FleetService,
    pub unlock: UnlockScheduler,
}

impl TestFleet {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let devices: Arc<dyn DeviceStore> = store.clone();
        let lock_events: Arc<dyn LockEventStore> = store.clone();
        let unlock = UnlockScheduler::new(Arc::clone(&devices), AUTO_UNLOCK_DELAY);
        let fleet = FleetService::new(devices, lock_events, unlock.clone());
        Self {
            store,
            fleet,
            unlock,
        }
    }

    /// Register a device with a generated name and a fresh token.
    pub async fn register_device(&self) -> Device {
        let name: String = Buzzword().fake();
        self.fleet
            .register(NewDevice {
                device_token: Uuid::new_v4(),
                display_name: format!("{name} handset"),
                os_version: Some("14".to_string()),
                app_version: Some("3.1.0".to_string()),
            })
            .await
            .expect("register device")
    }

    /// A sweep job over the same store, with a short period for tests.
    pub fn sweep_job(&self) -> OfflineSweepJob {
        OfflineSweepJob::new(self.store.clone(), Duration::from_secs(60))
    }
}

/// Let spawned timer tasks run after the paused clock has been advanced.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
