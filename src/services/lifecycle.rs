//! License lifecycle - creation, revocation, blocking and expiry.
//!
//! # Usability
//!
//! A license can take activations only while it is active, not blocked and
//! not expired. Failures are reported in a fixed order so clients can tell
//! them apart:
//!
//! 1. `Inactive` - revoked, permanently dead
//! 2. `Blocked` - held by an administrator
//! 3. `Expired` - validity period is over

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::license::{CreateLicenseRequest, License},
    services::key_generator::KeyGenerator,
    store::{LicenseStore, Mutation},
};

/// Attempts at finding an unused key before giving up.
pub const MAX_KEY_ATTEMPTS: usize = 5;

/// Whether `license` may take activations at `now`.
pub fn is_usable(license: &License, now: DateTime<Utc>) -> bool {
    check_usable(license, now).is_ok()
}

/// Like `is_usable`, but names the first failing condition.
///
/// # Errors
///
/// `Inactive`, `Blocked` or `Expired`, checked in that order.
pub fn check_usable(license: &License, now: DateTime<Utc>) -> Result<(), AppError> {
    if !license.active {
        return Err(AppError::Inactive);
    }
    if license.blocked {
        return Err(AppError::Blocked);
    }
    match license.expires_at {
        Some(expires_at) if expires_at <= now => Err(AppError::Expired),
        _ => Ok(()),
    }
}

/// Absent or non-positive device limits fall back to a single device.
fn resolve_max_devices(requested: Option<i64>) -> Result<u32, AppError> {
    match requested {
        Some(max) if max > 0 => u32::try_from(max)
            .map_err(|_| AppError::InvalidRequest("maxDevices is too large".to_string())),
        _ => Ok(1),
    }
}

/// `None` or `0` days means perpetual.
fn resolve_expiry(
    now: DateTime<Utc>,
    duration_days: Option<i64>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    match duration_days {
        None | Some(0) => Ok(None),
        Some(days) if days < 0 => Err(AppError::InvalidRequest(
            "durationDays must not be negative".to_string(),
        )),
        Some(days) => TimeDelta::try_days(days)
            .and_then(|delta| now.checked_add_signed(delta))
            .map(Some)
            .ok_or_else(|| AppError::InvalidRequest("durationDays is too large".to_string())),
    }
}

/// Issue a new license.
///
/// # Process
///
/// 1. Validate owner, duration and device limit
/// 2. Generate a key and insert the record
/// 3. On key collision, retry with a fresh key (up to `MAX_KEY_ATTEMPTS`)
///
/// # Errors
///
/// - `InvalidRequest`: blank owner, negative or oversized duration
/// - `KeyGenerationExhausted`: every attempt collided
/// - `Storage`: persistence failed
pub async fn create_license(
    store: &dyn LicenseStore,
    keys: &dyn KeyGenerator,
    now: DateTime<Utc>,
    request: CreateLicenseRequest,
) -> Result<License, AppError> {
    let owner = request.owner.trim();
    if owner.is_empty() {
        return Err(AppError::InvalidRequest("owner is required".to_string()));
    }

    let expires_at = resolve_expiry(now, request.duration_days)?;
    let max_devices = resolve_max_devices(request.max_devices)?;

    for attempt in 1..=MAX_KEY_ATTEMPTS {
        let license = License {
            id: Uuid::new_v4(),
            key: License::normalize_key(&keys.generate()),
            owner: owner.to_string(),
            expires_at,
            active: true,
            blocked: false,
            created_at: now,
            max_devices,
            devices: Vec::new(),
        };

        match store.insert(license.clone()).await {
            Ok(()) => {
                tracing::info!(
                    license_id = %license.id,
                    max_devices,
                    perpetual = expires_at.is_none(),
                    "license created"
                );
                return Ok(license);
            }
            Err(AppError::DuplicateKey) => {
                tracing::warn!(attempt, "generated license key collided, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    Err(AppError::KeyGenerationExhausted)
}

/// Revoke a license. Revocation is permanent and idempotent.
pub async fn revoke_license(store: &dyn LicenseStore, id: Uuid) -> Result<License, AppError> {
    let (license, mutation) = store
        .update(
            id,
            Box::new(|license: &mut License| -> Result<Mutation, AppError> {
                if !license.active {
                    return Ok(Mutation::Unchanged);
                }
                license.active = false;
                Ok(Mutation::Changed)
            }),
        )
        .await?;

    if mutation == Mutation::Changed {
        tracing::info!(license_id = %id, "license revoked");
    }

    Ok(license)
}

/// Set the administrator block flag to `blocked`.
pub async fn set_blocked(
    store: &dyn LicenseStore,
    id: Uuid,
    blocked: bool,
) -> Result<License, AppError> {
    let (license, _) = store
        .update(
            id,
            Box::new(move |license: &mut License| -> Result<Mutation, AppError> {
                if license.blocked == blocked {
                    return Ok(Mutation::Unchanged);
                }
                license.blocked = blocked;
                Ok(Mutation::Changed)
            }),
        )
        .await?;

    tracing::info!(license_id = %id, blocked, "license block flag set");
    Ok(license)
}

/// Flip the administrator block flag.
///
/// The read and the flip happen under the store lock, so two concurrent
/// toggles always cancel out.
pub async fn toggle_block(store: &dyn LicenseStore, id: Uuid) -> Result<License, AppError> {
    let (license, _) = store
        .update(
            id,
            Box::new(|license: &mut License| -> Result<Mutation, AppError> {
                license.blocked = !license.blocked;
                Ok(Mutation::Changed)
            }),
        )
        .await?;

    tracing::info!(license_id = %id, blocked = license.blocked, "license block toggled");
    Ok(license)
}

/// Permanently delete a license.
///
/// This is an administrative escape hatch; no trace of the license remains.
pub async fn delete_license(store: &dyn LicenseStore, id: Uuid) -> Result<License, AppError> {
    let license = store.remove(id).await?;
    tracing::info!(license_id = %id, "license deleted");
    Ok(license)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn license(now: DateTime<Utc>) -> License {
        License {
            id: Uuid::new_v4(),
            key: "ABC".to_string(),
            owner: "ACME".to_string(),
            expires_at: Some(now + Duration::days(1)),
            active: true,
            blocked: false,
            created_at: now,
            max_devices: 1,
            devices: Vec::new(),
        }
    }

    #[test]
    fn fresh_license_is_usable() {
        let now = Utc::now();
        assert!(is_usable(&license(now), now));
    }

    #[test]
    fn expiry_is_exclusive() {
        let now = Utc::now();
        let license = license(now);
        let expires_at = license.expires_at.unwrap();
        assert!(matches!(
            check_usable(&license, expires_at),
            Err(AppError::Expired)
        ));
        assert!(is_usable(&license, expires_at - Duration::seconds(1)));
    }

    #[test]
    fn perpetual_license_never_expires() {
        let now = Utc::now();
        let license = License {
            expires_at: None,
            ..license(now)
        };
        assert!(is_usable(&license, now + Duration::days(365 * 100)));
    }

    #[test]
    fn failures_follow_precedence() {
        let now = Utc::now();
        let later = now + Duration::days(2);

        let mut license = license(now);
        license.active = false;
        license.blocked = true;
        assert!(matches!(check_usable(&license, later), Err(AppError::Inactive)));

        license.active = true;
        assert!(matches!(check_usable(&license, later), Err(AppError::Blocked)));

        license.blocked = false;
        assert!(matches!(check_usable(&license, later), Err(AppError::Expired)));
    }

    #[test]
    fn device_limit_defaults_to_one() {
        assert_eq!(resolve_max_devices(None).unwrap(), 1);
        assert_eq!(resolve_max_devices(Some(0)).unwrap(), 1);
        assert_eq!(resolve_max_devices(Some(-3)).unwrap(), 1);
        assert_eq!(resolve_max_devices(Some(4)).unwrap(), 4);
        assert!(resolve_max_devices(Some(i64::MAX)).is_err());
    }

    #[test]
    fn expiry_resolution() {
        let now = Utc::now();
        assert_eq!(resolve_expiry(now, None).unwrap(), None);
        assert_eq!(resolve_expiry(now, Some(0)).unwrap(), None);
        assert_eq!(
            resolve_expiry(now, Some(30)).unwrap(),
            Some(now + Duration::days(30))
        );
        assert!(resolve_expiry(now, Some(-1)).is_err());
        assert!(resolve_expiry(now, Some(i64::MAX)).is_err());
    }

    #[tokio::test]
    async fn set_blocked_is_explicit_and_idempotent() {
        let store = crate::store::JsonFileStore::in_memory();
        let stored = license(Utc::now());
        store.insert(stored.clone()).await.unwrap();

        assert!(set_blocked(&store, stored.id, true).await.unwrap().blocked);
        assert!(set_blocked(&store, stored.id, true).await.unwrap().blocked);
        assert!(!set_blocked(&store, stored.id, false).await.unwrap().blocked);
        assert!(matches!(
            set_blocked(&store, Uuid::new_v4(), true).await.unwrap_err(),
            AppError::LicenseNotFound
        ));
    }
}
