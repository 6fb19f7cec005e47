//! License key server.
//!
//! Issues, validates and revokes software license keys, enforcing a
//! per-license device quota and administrator-gated blocking.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: `LicenseStore` trait with a JSON snapshot file backend and
//!   a PostgreSQL (sqlx) backend
//! - **Admin Authentication**: shared secret, constant-time comparison
//! - **Format**: JSON requests/responses

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::services::LicenseService;

/// CORS policy for the browser admin front-end.
///
/// Origins that are not valid header values are skipped with a warning.
/// An empty list allows no cross-origin requests.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the HTTP router.
///
/// # Routes
///
/// - `GET /health`
/// - `POST /api/v1/licenses`, `GET /api/v1/licenses`
/// - `DELETE /api/v1/licenses/{id}`
/// - `POST /api/v1/licenses/{id}/revoke`
/// - `POST /api/v1/licenses/{id}/block`
/// - `GET /api/v1/keys/{key}`
/// - `POST /api/v1/keys/{key}/activate`
/// - `POST /api/v1/keys/{key}/deactivate`
pub fn build_router(service: LicenseService, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        // License management (addressed by id)
        .route(
            "/api/v1/licenses",
            post(handlers::licenses::create_license).get(handlers::licenses::list_licenses),
        )
        .route(
            "/api/v1/licenses/{id}",
            delete(handlers::licenses::delete_license),
        )
        .route(
            "/api/v1/licenses/{id}/revoke",
            post(handlers::licenses::revoke_license),
        )
        .route(
            "/api/v1/licenses/{id}/block",
            post(handlers::licenses::toggle_block),
        )
        // Client-facing routes (addressed by key)
        .route(
            "/api/v1/keys/{key}",
            get(handlers::licenses::get_license_by_key),
        )
        .route(
            "/api/v1/keys/{key}/activate",
            post(handlers::activations::activate),
        )
        .route(
            "/api/v1/keys/{key}/deactivate",
            post(handlers::activations::deactivate),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(service)
}
