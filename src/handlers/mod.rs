//! HTTP request handlers (route handlers).
//!
//! Each handler extracts request data, calls `LicenseService` and turns the
//! result into a JSON response. Business rules live in `services`.

/// Device activation endpoints
pub mod activations;
/// Extractors reporting failures as `AppError`
pub mod extract;
/// Health check endpoint
pub mod health;
/// License management endpoints
pub mod licenses;
