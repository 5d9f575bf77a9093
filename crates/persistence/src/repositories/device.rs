//! Device repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{Device, NewDevice};
use domain::store::{DeviceStore, StoreError};

use crate::entities::DeviceEntity;

const DEVICE_COLUMNS: &str = "id, device_token, display_name, os_version, app_version, \
     enabled, presence, lock_state, last_seen_at, created_at, updated_at";

/// Repository for device-related database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_token(&self, token: Uuid) -> Result<Option<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE device_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_all(&self) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Insert a device, or refresh its registered fields when the token is
    /// already known. Presence, lock state and `last_seen_at` are owned by
    /// other write paths and left untouched on conflict.
    async fn upsert_registration(&self, new: &NewDevice) -> Result<DeviceEntity, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            INSERT INTO devices
                (device_token, display_name, os_version, app_version,
                 enabled, presence, lock_state, last_seen_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, true, 'offline', 'unlocked', NULL, NOW(), NOW())
            ON CONFLICT (device_token) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                os_version = EXCLUDED.os_version,
                app_version = EXCLUDED.app_version,
                updated_at = EXCLUDED.updated_at
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(new.device_token)
        .bind(&new.display_name)
        .bind(&new.os_version)
        .bind(&new.app_version)
        .fetch_one(&self.pool)
        .await
    }

    /// Write a full device record. The single-row update is the unit of
    /// atomicity; concurrent writers resolve as last-write-wins.
    async fn save(&self, device: &Device) -> Result<DeviceEntity, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(&format!(
            r#"
            INSERT INTO devices
                (id, device_token, display_name, os_version, app_version,
                 enabled, presence, lock_state, last_seen_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                device_token = EXCLUDED.device_token,
                display_name = EXCLUDED.display_name,
                os_version = EXCLUDED.os_version,
                app_version = EXCLUDED.app_version,
                enabled = EXCLUDED.enabled,
                presence = EXCLUDED.presence,
                lock_state = EXCLUDED.lock_state,
                last_seen_at = EXCLUDED.last_seen_at,
                updated_at = EXCLUDED.updated_at
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(device.id)
        .bind(device.device_token)
        .bind(&device.display_name)
        .bind(&device.os_version)
        .bind(&device.app_version)
        .bind(device.enabled)
        .bind(device.presence)
        .bind(device.lock_state)
        .bind(device.last_seen_at)
        .bind(device.created_at)
        .bind(device.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn remove(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DeviceStore for DeviceRepository {
    async fn get(&self, id: i64) -> Result<Option<Device>, StoreError> {
        let entity = self.find_by_id(id).await.map_err(map_store_err)?;
        Ok(entity.map(Into::into))
    }

    async fn get_by_token(&self, token: Uuid) -> Result<Option<Device>, StoreError> {
        let entity = self.find_by_token(token).await.map_err(map_store_err)?;
        Ok(entity.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Device>, StoreError> {
        let entities = self.find_all().await.map_err(map_store_err)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn register(&self, new: NewDevice) -> Result<Device, StoreError> {
        let entity = self
            .upsert_registration(&new)
            .await
            .map_err(map_store_err)?;
        Ok(entity.into())
    }

    async fn put(&self, device: &Device) -> Result<Device, StoreError> {
        let entity = self.save(device).await.map_err(map_store_err)?;
        Ok(entity.into())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let affected = self.remove(id).await.map_err(map_store_err)?;
        Ok(affected > 0)
    }
}

/// Map sqlx failures onto the store error taxonomy.
pub(crate) fn map_store_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Conflict(db_err.to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}
