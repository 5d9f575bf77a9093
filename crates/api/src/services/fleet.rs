//! Fleet service: the shared state-transition contract.
//!
//! Every foreground write path (presence updates, lock transitions, the
//! administrative flag, deletion) goes through this service so that lock
//! timer bookkeeping stays consistent with the store.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use domain::models::device::DeviceSummary;
use domain::models::{Device, LockEvent, LockState, NewDevice, NewLockEvent};
use domain::store::{DeviceStore, LockEventStore, StoreError};
use shared::pagination::{paginate, PageQuery, Paged};
use uuid::Uuid;

use super::unlock_scheduler::UnlockScheduler;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct FleetService {
    devices: Arc<dyn DeviceStore>,
    lock_events: Arc<dyn LockEventStore>,
    unlock: UnlockScheduler,
}

impl FleetService {
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        lock_events: Arc<dyn LockEventStore>,
        unlock: UnlockScheduler,
    ) -> Self {
        Self {
            devices,
            lock_events,
            unlock,
        }
    }

    /// Register a device, or refresh its registered fields.
    pub async fn register(&self, new: NewDevice) -> Result<Device, FleetError> {
        let device = self.devices.register(new).await?;
        info!(device_id = device.id, token = %device.device_token, "device registered");
        Ok(device)
    }

    pub async fn get(&self, id: i64) -> Result<Device, FleetError> {
        self.devices
            .get(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("device {id}")))
    }

    pub async fn get_by_token(&self, token: Uuid) -> Result<Device, FleetError> {
        self.devices
            .get_by_token(token)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("device with token {token}")))
    }

    pub async fn list_devices(&self, page: PageQuery) -> Result<Paged<DeviceSummary>, FleetError> {
        let devices = self.devices.list_all().await?;
        let summaries: Vec<DeviceSummary> = devices.into_iter().map(Into::into).collect();
        Ok(paginate(summaries, page))
    }

    /// Presence update path: record a liveness ping.
    ///
    /// Only stamps `last_seen_at`; online/offline classification is left to
    /// the next sweep pass.
    pub async fn record_liveness(&self, token: Uuid) -> Result<Device, FleetError> {
        let mut device = self.get_by_token(token).await?;

        let now = Utc::now();
        // A ping never moves last_seen_at backward.
        if device.last_seen_at.map_or(true, |seen| now > seen) {
            device.last_seen_at = Some(now);
        }
        device.updated_at = now;

        Ok(self.devices.put(&device).await?)
    }

    /// Place a device under an emergency lock.
    ///
    /// Writes the lock transition, arms the deferred unlock timer, then
    /// appends a LockEvent to the audit trail. The timer is armed before the
    /// audit write: once the lock state has landed it must stay time-bounded
    /// even when the append fails.
    pub async fn emergency_lock(&self, id: i64, lock_code: &str) -> Result<Device, FleetError> {
        let mut device = self.get(id).await?;

        let now = Utc::now();
        device.lock_state = LockState::Locked;
        device.updated_at = now;
        let device = self.devices.put(&device).await?;

        self.unlock.arm(device.id);
        info!(device_id = device.id, "emergency lock engaged");

        self.lock_events
            .append(NewLockEvent {
                device_id: device.id,
                lock_code: lock_code.to_string(),
                locked_at: now,
            })
            .await?;

        Ok(device)
    }

    /// Release a lock explicitly, cancelling the deferred timer.
    pub async fn manual_unlock(&self, id: i64) -> Result<Device, FleetError> {
        // Cancel before writing so the timer cannot fire mid-transition.
        self.unlock.cancel(id);

        let mut device = self.get(id).await?;
        device.lock_state = LockState::Unlocked;
        device.updated_at = Utc::now();
        let device = self.devices.put(&device).await?;

        info!(device_id = device.id, "device unlocked manually");
        Ok(device)
    }

    /// Flip the administrative enable flag. Independent of presence and lock
    /// state.
    pub async fn set_enabled(&self, id: i64, enabled: bool) -> Result<Device, FleetError> {
        let mut device = self.get(id).await?;
        device.enabled = enabled;
        device.updated_at = Utc::now();
        Ok(self.devices.put(&device).await?)
    }

    /// Remove a device record, cancelling any pending unlock timer first.
    pub async fn delete_device(&self, id: i64) -> Result<(), FleetError> {
        self.unlock.cancel(id);

        if self.devices.delete(id).await? {
            info!(device_id = id, "device deleted");
            Ok(())
        } else {
            Err(FleetError::NotFound(format!("device {id}")))
        }
    }

    /// Audit trail for a device, newest first. Events outlive the device, so
    /// this does not require the device record to still exist.
    pub async fn lock_events(
        &self,
        device_id: i64,
        page: PageQuery,
    ) -> Result<Paged<LockEvent>, FleetError> {
        let events = self.lock_events.list_for_device(device_id).await?;
        Ok(paginate(events, page))
    }
}
