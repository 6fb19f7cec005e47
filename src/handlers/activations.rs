//! Device activation HTTP handlers.
//!
//! - POST /api/v1/keys/{key}/activate - Bind a device to a license
//! - POST /api/v1/keys/{key}/deactivate - Release a device slot

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    handlers::extract::ApiJson,
    models::license::{ActivationResponse, DeactivationResponse, DeviceRequest},
    services::LicenseService,
};

/// Activate a device on a license.
///
/// # Request Body
///
/// ```json
/// { "deviceId": "workstation-42" }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "admitted": true,
///   "reason": "activated",   // or "already_activated"
///   "devicesUsed": 1,
///   "maxDevices": 2
/// }
/// ```
///
/// # Errors
///
/// - **400**: missing `deviceId`
/// - **404**: unknown key
/// - **403**: license inactive, blocked, expired, or quota exceeded
pub async fn activate(
    State(service): State<LicenseService>,
    Path(key): Path<String>,
    ApiJson(request): ApiJson<DeviceRequest>,
) -> Result<Json<ActivationResponse>, AppError> {
    let (license, status) = service.activate(&key, &request.device_id).await?;
    Ok(Json(ActivationResponse::new(status, &license)))
}

/// Deactivate a device.
///
/// # Errors
///
/// - **404**: unknown key or device not bound
pub async fn deactivate(
    State(service): State<LicenseService>,
    Path(key): Path<String>,
    ApiJson(request): ApiJson<DeviceRequest>,
) -> Result<Json<DeactivationResponse>, AppError> {
    service.deactivate(&key, &request.device_id).await?;
    Ok(Json(DeactivationResponse { removed: true }))
}
