//! License Key Server - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the license store (PostgreSQL if `DATABASE_URL` is set, JSON file otherwise)
//! 3. Build the admin gate from the configured secret
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use std::sync::Arc;

use license_key_server::{
    build_router,
    config::Config,
    cors_layer, db,
    error::StorageError,
    services::{LicenseService, admin_gate::AdminGate},
    store::{JsonFileStore, LicenseStore, PgLicenseStore},
};
use tracing_subscriber::EnvFilter;

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn LicenseStore>> {
    match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool)
                .await
                .map_err(StorageError::from)?;
            tracing::info!("Database migrations complete");

            Ok(Arc::new(PgLicenseStore::new(pool)))
        }
        None => {
            let store = JsonFileStore::open(&config.license_db_path).await?;
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store = open_store(&config).await?;

    // The secret is read exactly once; the gate is immutable afterwards
    let admin = AdminGate::new(&config.admin_secret);
    let service = LicenseService::new(store, admin);

    let app = build_router(service, cors_layer(&config.cors_allowed_origins));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("License server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
