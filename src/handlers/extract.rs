//! Request extractors that report failures as `AppError`.
//!
//! axum's own `Json` and `Path` extractors answer malformed input with a
//! plain-text body. These wrappers keep every failure on the JSON error
//! format.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::AppError;

/// JSON request body. Malformed or incomplete bodies become `InvalidRequest`.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// License id path segment.
///
/// An id that is not a UUID cannot name a stored license, so it is
/// reported as `LicenseNotFound`.
#[derive(Debug, Clone, Copy)]
pub struct LicenseId(pub Uuid);

impl<S> FromRequestParts<S> for LicenseId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state).await?;
        Uuid::parse_str(&raw)
            .map(LicenseId)
            .map_err(|_| AppError::LicenseNotFound)
    }
}
