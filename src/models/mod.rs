//! Data models for stored records and API bodies.

/// License and activation records
pub mod license;
