//! Shared test helpers for license server tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use license_key_server::{
    build_router,
    clock::ManualClock,
    cors_layer,
    models::license::{CreateLicenseRequest, License},
    services::{LicenseService, admin_gate::AdminGate},
    store::JsonFileStore,
};
use secrecy::SecretString;

pub const ADMIN_SECRET: &str = "test-admin-secret";

/// In-memory service on a manual clock starting at 2026-01-01 00:00 UTC.
pub fn test_service() -> (LicenseService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    ));
    let service = LicenseService::new(
        Arc::new(JsonFileStore::in_memory()),
        AdminGate::new(&SecretString::from(ADMIN_SECRET.to_string())),
    )
    .with_clock(clock.clone());
    (service, clock)
}

pub fn create_request(duration_days: i64, max_devices: i64) -> CreateLicenseRequest {
    CreateLicenseRequest {
        owner: "ACME Ltd".to_string(),
        duration_days: Some(duration_days),
        max_devices: Some(max_devices),
    }
}

pub async fn create_license(
    service: &LicenseService,
    duration_days: i64,
    max_devices: i64,
) -> License {
    service
        .create_license(create_request(duration_days, max_devices))
        .await
        .unwrap()
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
pub async fn spawn_test_server(service: LicenseService) -> String {
    let app = build_router(service, cors_layer(&[]));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}
