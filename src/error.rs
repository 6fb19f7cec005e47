//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failure of the persistence layer behind a `LicenseStore`.
///
/// These are never business outcomes. They are logged and reported to the
/// client as a generic internal error.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// PostgreSQL query or connection failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed at startup.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row violates the license invariants.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Application-wide error type.
///
/// Every variant except `Storage` is an expected business outcome and is
/// returned to the caller as a structured response.
///
/// # Error Categories
///
/// - **Resource Errors**: unknown license id/key or unbound device
/// - **Usability Errors**: license inactive, blocked or expired (checked in that order)
/// - **Quota Errors**: no free activation slot
/// - **Authorization Errors**: wrong admin secret
/// - **Generation Errors**: key collisions
/// - **Storage Errors**: persistence failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No license matches the given id or key.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("License not found")]
    LicenseNotFound,

    /// The device is not bound to the license.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Device not found")]
    DeviceNotFound,

    /// The license has been revoked.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("License is inactive")]
    Inactive,

    /// The license is blocked by an administrator.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("License is blocked")]
    Blocked,

    /// The license validity period has ended.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("License has expired")]
    Expired,

    /// Every activation slot of the license is in use.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Device quota exceeded")]
    QuotaExceeded,

    /// The admin secret did not match.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Invalid admin secret")]
    Unauthorized,

    /// A generated key collided with a stored one.
    ///
    /// Retried internally by license creation and never expected at the boundary.
    #[error("Duplicate license key")]
    DuplicateKey,

    /// Every key generation attempt collided.
    ///
    /// Returns HTTP 500 Internal Server Error.
    #[error("Could not generate a unique license key")]
    KeyGenerationExhausted,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Persistence failed; the store keeps its previous state.
    ///
    /// Returns HTTP 500 Internal Server Error (hides details from client).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl AppError {
    /// Stable machine-readable code used in the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::LicenseNotFound => "license_not_found",
            AppError::DeviceNotFound => "device_not_found",
            AppError::Inactive => "license_inactive",
            AppError::Blocked => "license_blocked",
            AppError::Expired => "license_expired",
            AppError::QuotaExceeded => "quota_exceeded",
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::DuplicateKey | AppError::KeyGenerationExhausted | AppError::Storage(_) => {
                "internal_error"
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `LicenseNotFound`, `DeviceNotFound` → 404 Not Found
/// - `Inactive`, `Blocked`, `Expired`, `QuotaExceeded`, `Unauthorized` → 403 Forbidden
/// - `InvalidRequest` → 400 Bad Request
/// - `DuplicateKey`, `KeyGenerationExhausted`, `Storage` → 500 Internal Server Error
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match self {
            AppError::LicenseNotFound | AppError::DeviceNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Inactive
            | AppError::Blocked
            | AppError::Expired
            | AppError::QuotaExceeded
            | AppError::Unauthorized => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::InvalidRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateKey | AppError::KeyGenerationExhausted => {
                tracing::error!(error = %self, "license creation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Storage(ref err) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
