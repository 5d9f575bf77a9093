//! Lock event audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable audit record of a lock action.
///
/// Created on every lock transition and never mutated. Lock events outlive
/// the device they reference; deleting a device does not cascade here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEvent {
    pub id: i64,
    pub device_id: i64,
    pub lock_code: String,
    pub locked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to append a lock event to the audit trail.
#[derive(Debug, Clone)]
pub struct NewLockEvent {
    pub device_id: i64,
    pub lock_code: String,
    pub locked_at: DateTime<Utc>,
}
