//! Lock event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the lock_events table.
#[derive(Debug, Clone, FromRow)]
pub struct LockEventEntity {
    pub id: i64,
    pub device_id: i64,
    pub lock_code: String,
    pub locked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<LockEventEntity> for domain::models::LockEvent {
    fn from(entity: LockEventEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            lock_code: entity.lock_code,
            locked_at: entity.locked_at,
            created_at: entity.created_at,
        }
    }
}
