//! Lock event audit trail handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::LockEvent;
use shared::pagination::{PageQuery, Paged};

/// Audit trail for one device, newest first. Available even after the
/// device record has been deleted.
///
/// GET /api/v1/devices/:id/lock-events
pub async fn list_device_lock_events(
    State(state): State<AppState>,
    Path(device_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paged<LockEvent>>, ApiError> {
    Ok(Json(state.fleet.lock_events(device_id, page).await?))
}
