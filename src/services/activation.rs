//! Device activation - admission control against the per-license quota.
//!
//! Every (license, device) pair is either unbound or bound. `activate_device`
//! binds, `deactivate_device` unbinds; there are no other transitions.
//!
//! # Atomicity
//!
//! The usability check, the duplicate check, the quota check and the append
//! all run inside one `LicenseStore::update` call. Concurrent activations of
//! the same license are serialized by the store, so the quota can never be
//! overrun and a device can never be bound twice.

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::license::{Activation, ActivationStatus, License},
    services::lifecycle,
    store::{LicenseStore, Mutation},
};

fn validate_device_id(device_id: &str) -> Result<(), AppError> {
    if device_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("deviceId is required".to_string()));
    }
    Ok(())
}

async fn resolve_key(store: &dyn LicenseStore, key: &str) -> Result<License, AppError> {
    store
        .find_by_key(key)
        .await?
        .ok_or(AppError::LicenseNotFound)
}

/// Bind `device_id` to the license identified by `key`.
///
/// # Process
///
/// 1. Resolve the license by key (case-insensitive)
/// 2. Reject if inactive, blocked or expired (in that order)
/// 3. Already bound devices succeed without changes
/// 4. Reject if every slot is taken
/// 5. Append the activation
///
/// Steps 2-5 execute atomically against the store.
///
/// # Errors
///
/// - `LicenseNotFound`: unknown key
/// - `Inactive`, `Blocked`, `Expired`: license not usable
/// - `QuotaExceeded`: no free slot
/// - `InvalidRequest`: blank device id
pub async fn activate_device(
    store: &dyn LicenseStore,
    key: &str,
    device_id: &str,
    now: DateTime<Utc>,
) -> Result<(License, ActivationStatus), AppError> {
    validate_device_id(device_id)?;
    let license = resolve_key(store, key).await?;

    let result = store
        .update(
            license.id,
            Box::new(|license: &mut License| -> Result<Mutation, AppError> {
                lifecycle::check_usable(license, now)?;

                if license.has_device(device_id) {
                    return Ok(Mutation::Unchanged);
                }

                if license.free_slots() == 0 {
                    return Err(AppError::QuotaExceeded);
                }

                license.devices.push(Activation {
                    device_id: device_id.to_string(),
                    activated_at: now,
                });
                Ok(Mutation::Changed)
            }),
        )
        .await;

    match result {
        Ok((license, Mutation::Changed)) => {
            tracing::info!(
                license_id = %license.id,
                devices = license.devices.len(),
                max_devices = license.max_devices,
                "device activated"
            );
            Ok((license, ActivationStatus::Activated))
        }
        Ok((license, Mutation::Unchanged)) => {
            tracing::debug!(license_id = %license.id, "device already activated");
            Ok((license, ActivationStatus::AlreadyActivated))
        }
        Err(err) => {
            if !matches!(err, AppError::Storage(_)) {
                tracing::warn!(license_id = %license.id, reason = %err, "activation rejected");
            }
            Err(err)
        }
    }
}

/// Unbind `device_id` from the license identified by `key`, freeing a slot.
///
/// Works regardless of whether the license is still usable.
///
/// # Errors
///
/// - `LicenseNotFound`: unknown key
/// - `DeviceNotFound`: the device is not bound
/// - `InvalidRequest`: blank device id
pub async fn deactivate_device(
    store: &dyn LicenseStore,
    key: &str,
    device_id: &str,
) -> Result<License, AppError> {
    validate_device_id(device_id)?;
    let license = resolve_key(store, key).await?;

    let (license, _) = store
        .update(
            license.id,
            Box::new(|license: &mut License| -> Result<Mutation, AppError> {
                let index = license
                    .devices
                    .iter()
                    .position(|d| d.device_id == device_id)
                    .ok_or(AppError::DeviceNotFound)?;
                license.devices.remove(index);
                Ok(Mutation::Changed)
            }),
        )
        .await?;

    tracing::info!(
        license_id = %license.id,
        devices = license.devices.len(),
        "device deactivated"
    );
    Ok(license)
}
