//! Lock event repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::models::{LockEvent, NewLockEvent};
use domain::store::{LockEventStore, StoreError};

use crate::entities::LockEventEntity;
use crate::repositories::device::map_store_err;

/// Repository for the lock event audit trail.
#[derive(Clone)]
pub struct LockEventRepository {
    pool: PgPool,
}

impl LockEventRepository {
    /// Creates a new LockEventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, event: &NewLockEvent) -> Result<LockEventEntity, sqlx::Error> {
        sqlx::query_as::<_, LockEventEntity>(
            r#"
            INSERT INTO lock_events (device_id, lock_code, locked_at, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, device_id, lock_code, locked_at, created_at
            "#,
        )
        .bind(event.device_id)
        .bind(&event.lock_code)
        .bind(event.locked_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_for_device(&self, device_id: i64) -> Result<Vec<LockEventEntity>, sqlx::Error> {
        sqlx::query_as::<_, LockEventEntity>(
            r#"
            SELECT id, device_id, lock_code, locked_at, created_at
            FROM lock_events
            WHERE device_id = $1
            ORDER BY locked_at DESC, id DESC
            "#,
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl LockEventStore for LockEventRepository {
    async fn append(&self, event: NewLockEvent) -> Result<LockEvent, StoreError> {
        let entity = self.insert(&event).await.map_err(map_store_err)?;
        Ok(entity.into())
    }

    async fn list_for_device(&self, device_id: i64) -> Result<Vec<LockEvent>, StoreError> {
        let entities = self
            .find_for_device(device_id)
            .await
            .map_err(map_store_err)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }
}
