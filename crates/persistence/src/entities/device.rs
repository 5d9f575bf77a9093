//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{LockState, Presence};

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: i64,
    pub device_token: Uuid,
    pub display_name: String,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
    pub enabled: bool,
    pub presence: Presence,
    pub lock_state: LockState,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeviceEntity> for domain::models::Device {
    fn from(entity: DeviceEntity) -> Self {
        Self {
            id: entity.id,
            device_token: entity.device_token,
            display_name: entity.display_name,
            os_version: entity.os_version,
            app_version: entity.app_version,
            enabled: entity.enabled,
            presence: entity.presence,
            lock_state: entity.lock_state,
            last_seen_at: entity.last_seen_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
