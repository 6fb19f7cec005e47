//! License service - the operations exposed at the API boundary.
//!
//! `LicenseService` bundles the store, clock, key generator and admin gate
//! and is shared with every HTTP handler as router state. It is cheap to
//! clone; all components sit behind `Arc`s.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    clock::{Clock, SystemClock},
    error::AppError,
    models::license::{ActivationStatus, CreateLicenseRequest, License},
    services::{
        activation,
        admin_gate::AdminGate,
        key_generator::{KeyGenerator, RandomKeyGenerator},
        lifecycle,
    },
    store::LicenseStore,
};

#[derive(Clone)]
pub struct LicenseService {
    store: Arc<dyn LicenseStore>,
    clock: Arc<dyn Clock>,
    keys: Arc<dyn KeyGenerator>,
    admin: Arc<AdminGate>,
}

impl LicenseService {
    /// Service using the system clock and random keys.
    pub fn new(store: Arc<dyn LicenseStore>, admin: AdminGate) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            keys: Arc::new(RandomKeyGenerator),
            admin: Arc::new(admin),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the key generator.
    pub fn with_key_generator(mut self, keys: Arc<dyn KeyGenerator>) -> Self {
        self.keys = keys;
        self
    }

    pub async fn create_license(&self, request: CreateLicenseRequest) -> Result<License, AppError> {
        lifecycle::create_license(
            self.store.as_ref(),
            self.keys.as_ref(),
            self.clock.now(),
            request,
        )
        .await
    }

    pub async fn list_licenses(&self) -> Result<Vec<License>, AppError> {
        self.store.list_all().await
    }

    pub async fn get_license_by_key(&self, key: &str) -> Result<License, AppError> {
        self.store
            .find_by_key(key)
            .await?
            .ok_or(AppError::LicenseNotFound)
    }

    pub async fn activate(
        &self,
        key: &str,
        device_id: &str,
    ) -> Result<(License, ActivationStatus), AppError> {
        activation::activate_device(self.store.as_ref(), key, device_id, self.clock.now()).await
    }

    pub async fn deactivate(&self, key: &str, device_id: &str) -> Result<License, AppError> {
        activation::deactivate_device(self.store.as_ref(), key, device_id).await
    }

    pub async fn revoke(&self, id: Uuid) -> Result<License, AppError> {
        lifecycle::revoke_license(self.store.as_ref(), id).await
    }

    /// Flip the block flag after checking the admin secret.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: wrong secret, nothing is read or changed
    /// - `LicenseNotFound`: unknown id
    pub async fn toggle_block(&self, id: Uuid, secret: &str) -> Result<License, AppError> {
        if !self.admin.authorize(secret) {
            return Err(AppError::Unauthorized);
        }
        lifecycle::toggle_block(self.store.as_ref(), id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<License, AppError> {
        lifecycle::delete_license(self.store.as_ref(), id).await
    }

    pub async fn check_health(&self) -> Result<(), AppError> {
        self.store.check_health().await
    }
}
