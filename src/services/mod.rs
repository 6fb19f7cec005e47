//! Business logic services.
//!
//! Services contain the license rules, separated from HTTP handlers.
//! They talk to storage only through the `LicenseStore` trait.

pub mod activation;
pub mod admin_gate;
pub mod key_generator;
pub mod license_service;
pub mod lifecycle;

pub use license_service::LicenseService;
