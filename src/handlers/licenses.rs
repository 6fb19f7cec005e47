//! License management HTTP handlers.
//!
//! This module implements the license-related API endpoints:
//! - POST /api/v1/licenses - Issue a new license
//! - GET /api/v1/licenses - List all licenses
//! - GET /api/v1/keys/{key} - Look up a license by key
//! - POST /api/v1/licenses/{id}/revoke - Revoke a license
//! - POST /api/v1/licenses/{id}/block - Toggle the block flag (admin secret required)
//! - DELETE /api/v1/licenses/{id} - Permanently delete a license

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::extract::{ApiJson, LicenseId},
    models::license::{BlockRequest, BlockResponse, CreateLicenseRequest, License, SuccessResponse},
    services::LicenseService,
};

/// Issue a new license.
///
/// # Request Body
///
/// ```json
/// {
///   "owner": "ACME Ltd",
///   "durationDays": 30,  // optional, 0 or absent = perpetual
///   "maxDevices": 2      // optional, defaults to 1
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the full license record
/// - **Error (400)**: missing or blank owner, malformed body, negative duration
/// - **Error (500)**: storage failure
pub async fn create_license(
    State(service): State<LicenseService>,
    ApiJson(request): ApiJson<CreateLicenseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let license = service.create_license(request).await?;
    Ok((StatusCode::CREATED, Json(license)))
}

/// List every license in issue order.
pub async fn list_licenses(
    State(service): State<LicenseService>,
) -> Result<Json<Vec<License>>, AppError> {
    Ok(Json(service.list_licenses().await?))
}

/// Look up a license by key. The key is case-insensitive.
///
/// # Response
///
/// - **Success (200 OK)**: the license record
/// - **Error (404)**: no license uses this key
pub async fn get_license_by_key(
    State(service): State<LicenseService>,
    Path(key): Path<String>,
) -> Result<Json<License>, AppError> {
    Ok(Json(service.get_license_by_key(&key).await?))
}

/// Revoke a license. Revoking twice succeeds.
///
/// # Response
///
/// - **Success (200 OK)**: `{"success": true}`
/// - **Error (404)**: unknown or malformed id
pub async fn revoke_license(
    State(service): State<LicenseService>,
    LicenseId(id): LicenseId,
) -> Result<Json<SuccessResponse>, AppError> {
    service.revoke(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Toggle the administrator block flag.
///
/// # Request Body
///
/// ```json
/// { "secret": "admin secret" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"success": true, "blocked": true}`
/// - **Error (403)**: wrong secret, flag unchanged
/// - **Error (404)**: unknown id
pub async fn toggle_block(
    State(service): State<LicenseService>,
    LicenseId(id): LicenseId,
    ApiJson(request): ApiJson<BlockRequest>,
) -> Result<Json<BlockResponse>, AppError> {
    let license = service.toggle_block(id, &request.secret).await?;
    Ok(Json(BlockResponse {
        success: true,
        blocked: license.blocked,
    }))
}

/// Permanently delete a license.
///
/// # Response
///
/// - **Success (204 No Content)**
/// - **Error (404)**: unknown id
pub async fn delete_license(
    State(service): State<LicenseService>,
    LicenseId(id): LicenseId,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
