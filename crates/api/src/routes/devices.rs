//! Device endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::device::{
    DeviceSummary, LockDeviceRequest, RegisterDeviceRequest, SetEnabledRequest,
};
use domain::models::Device;
use shared::pagination::{PageQuery, Paged};

/// Register or update a device.
///
/// POST /api/v1/devices/register
pub async fn register_device(
    State(state): State<AppState>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<Json<Device>, ApiError> {
    request.validate()?;
    let device = state.fleet.register(request.into()).await?;
    Ok(Json(device))
}

/// List the fleet, paged, ordered by id.
///
/// GET /api/v1/devices?page=<n>&perPage=<n>
pub async fn list_devices(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paged<DeviceSummary>>, ApiError> {
    Ok(Json(state.fleet.list_devices(page).await?))
}

/// GET /api/v1/devices/:id
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.fleet.get(id).await?))
}

/// GET /api/v1/devices/by-token/:token
pub async fn get_device_by_token(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.fleet.get_by_token(token).await?))
}

/// Presence update path: record a liveness ping by external token.
///
/// POST /api/v1/devices/by-token/:token/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.fleet.record_liveness(token).await?))
}

/// Engage an emergency lock. Auto-releases after the fixed grace period
/// unless unlocked or re-locked first.
///
/// POST /api/v1/devices/:id/lock
pub async fn lock_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<LockDeviceRequest>,
) -> Result<Json<Device>, ApiError> {
    request.validate()?;
    let device = state.fleet.emergency_lock(id, &request.lock_code).await?;
    Ok(Json(device))
}

/// Release a lock explicitly.
///
/// POST /api/v1/devices/:id/unlock
pub async fn unlock_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.fleet.manual_unlock(id).await?))
}

/// Flip the administrative enable flag.
///
/// PUT /api/v1/devices/:id/enabled
pub async fn set_enabled(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SetEnabledRequest>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.fleet.set_enabled(id, request.enabled).await?))
}

/// DELETE /api/v1/devices/:id
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.fleet.delete_device(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
