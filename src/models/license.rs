//! License data models and API request/response types.
//!
//! This module defines:
//! - `License`: the stored license record
//! - `Activation`: one device bound to a license
//! - Request and response bodies for the license endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An issued license.
///
/// This is both the persisted record and the API representation. Records
/// are only built by license creation and only changed through
/// `LicenseStore::update` by the lifecycle and activation services.
///
/// # Invariants
///
/// - `key` is unique across the store and stored uppercase
/// - `devices.len() <= max_devices`
/// - each `device_id` appears at most once in `devices`
/// - once `active` is false it stays false
/// - `expires_at`, when present, is after `created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    /// Unique identifier for this license
    pub id: Uuid,

    /// Customer-facing license key (32 uppercase hex characters)
    pub key: String,

    /// Free-text customer label
    pub owner: String,

    /// End of validity, `None` for perpetual licenses
    ///
    /// Serialized as `null` when absent.
    pub expires_at: Option<DateTime<Utc>>,

    /// False once the license has been revoked
    pub active: bool,

    /// Administrator block flag, independent of `active`
    pub blocked: bool,

    /// When the license was issued
    pub created_at: DateTime<Utc>,

    /// Maximum number of simultaneously bound devices (at least 1)
    pub max_devices: u32,

    /// Bound devices in activation order
    pub devices: Vec<Activation>,
}

impl License {
    /// Normalize a key for storage and lookup.
    pub fn normalize_key(key: &str) -> String {
        key.trim().to_uppercase()
    }

    /// Whether `device_id` is currently bound to this license.
    pub fn has_device(&self, device_id: &str) -> bool {
        self.devices.iter().any(|d| d.device_id == device_id)
    }

    /// Number of activation slots still available.
    pub fn free_slots(&self) -> u32 {
        self.max_devices
            .saturating_sub(u32::try_from(self.devices.len()).unwrap_or(u32::MAX))
    }

    /// Check the per-record invariants, describing the first violation.
    ///
    /// Key uniqueness spans the whole store and is checked by the backends.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.key.is_empty() || self.key != Self::normalize_key(&self.key) {
            return Err(format!("license {} has non-normalized key", self.id));
        }
        if self.max_devices < 1 {
            return Err(format!("license {} has maxDevices 0", self.id));
        }
        if self.devices.len() > self.max_devices as usize {
            return Err(format!(
                "license {} binds {} devices but allows {}",
                self.id,
                self.devices.len(),
                self.max_devices
            ));
        }
        for (index, device) in self.devices.iter().enumerate() {
            if self.devices[..index]
                .iter()
                .any(|d| d.device_id == device.device_id)
            {
                return Err(format!(
                    "license {} binds device {} twice",
                    self.id, device.device_id
                ));
            }
        }
        if self
            .expires_at
            .is_some_and(|expires_at| expires_at <= self.created_at)
        {
            return Err(format!("license {} expires before it was created", self.id));
        }
        Ok(())
    }
}

/// A device bound to a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    /// Client-supplied device identifier
    pub device_id: String,

    /// When the device was admitted
    pub activated_at: DateTime<Utc>,
}

/// Request body for creating a new license.
///
/// # JSON Example
///
/// ```json
/// {
///   "owner": "ACME Ltd",
///   "durationDays": 30,
///   "maxDevices": 2
/// }
/// ```
///
/// # Validation
///
/// - `owner`: Required, must not be blank
/// - `durationDays`: Optional, `0` or absent means perpetual, negative is rejected
/// - `maxDevices`: Optional, absent or `<= 0` means 1
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicenseRequest {
    pub owner: String,

    #[serde(default)]
    pub duration_days: Option<i64>,

    #[serde(default)]
    pub max_devices: Option<i64>,
}

/// Request body for activating or deactivating a device.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub device_id: String,
}

/// Request body for the block toggle.
#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    /// Administrator secret checked by the admin gate
    pub secret: String,
}

/// How an admitted activation was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    /// The device took a new slot.
    Activated,
    /// The device was already bound; nothing changed.
    AlreadyActivated,
}

/// Response body for a successful activation.
///
/// ```json
/// {
///   "admitted": true,
///   "reason": "activated",
///   "devicesUsed": 1,
///   "maxDevices": 2
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    pub admitted: bool,
    pub reason: ActivationStatus,
    pub devices_used: u32,
    pub max_devices: u32,
}

impl ActivationResponse {
    pub fn new(status: ActivationStatus, license: &License) -> Self {
        Self {
            admitted: true,
            reason: status,
            devices_used: license.max_devices - license.free_slots(),
            max_devices: license.max_devices,
        }
    }
}

/// Response body for a successful deactivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeactivationResponse {
    pub removed: bool,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response body for the block toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    pub success: bool,
    pub blocked: bool,
}
