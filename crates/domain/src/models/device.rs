//! Device domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Time-driven online/offline classification, owned by the heartbeat sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "presence_state", rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    /// Classify a heartbeat age against the staleness threshold.
    ///
    /// The boundary is exclusive: a device whose heartbeat is exactly as old
    /// as the threshold still counts as online.
    pub fn classify(age: Duration, threshold: Duration) -> Presence {
        if age > threshold {
            Presence::Offline
        } else {
            Presence::Online
        }
    }
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Presence::Online => write!(f, "online"),
            Presence::Offline => write!(f, "offline"),
        }
    }
}

/// Event-driven lock classification, owned by the lock/unlock paths and the
/// deferred unlock scheduler. Never touched by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "lock_state", rename_all = "lowercase")]
pub enum LockState {
    Unlocked,
    Locked,
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockState::Unlocked => write!(f, "unlocked"),
            LockState::Locked => write!(f, "locked"),
        }
    }
}

/// Represents one registered device in the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    /// External stable token; the identity clients report with.
    pub device_token: Uuid,
    pub display_name: String,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
    /// Administrative enable/disable flag. Independent axis, not time-driven.
    pub enabled: bool,
    pub presence: Presence,
    pub lock_state: LockState,
    /// Updated only by the presence update path. Null until the device
    /// reports for the first time.
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Age of the last heartbeat relative to `now`, or `None` if the device
    /// has never reported.
    pub fn heartbeat_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_seen_at.map(|seen| now - seen)
    }
}

/// Fields needed to create a device record on first registration.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub device_token: Uuid,
    pub display_name: String,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
}

/// Request payload for device registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub device_token: Uuid,

    #[validate(custom(function = "display_name"))]
    pub display_name: String,

    pub os_version: Option<String>,
    pub app_version: Option<String>,
}

impl From<RegisterDeviceRequest> for NewDevice {
    fn from(req: RegisterDeviceRequest) -> Self {
        Self {
            device_token: req.device_token,
            display_name: req.display_name.trim().to_string(),
            os_version: req.os_version,
            app_version: req.app_version,
        }
    }
}

/// Request payload for an emergency lock.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LockDeviceRequest {
    #[validate(custom(function = "lock_code"))]
    pub lock_code: String,
}

/// Request payload for flipping the administrative enable flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

/// Device summary for fleet listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: i64,
    pub device_token: Uuid,
    pub display_name: String,
    pub enabled: bool,
    pub presence: Presence,
    pub lock_state: LockState,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl From<Device> for DeviceSummary {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            device_token: device.device_token,
            display_name: device.display_name,
            enabled: device.enabled,
            presence: device.presence,
            lock_state: device.lock_state,
            last_seen_at: device.last_seen_at,
        }
    }
}

fn display_name(name: &str) -> Result<(), validator::ValidationError> {
    shared::validation::validate_display_name(name)
}

fn lock_code(code: &str) -> Result<(), validator::ValidationError> {
    shared::validation::validate_lock_code(code)
}
