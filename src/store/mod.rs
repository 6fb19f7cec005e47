//! License persistence.
//!
//! All access to stored licenses goes through the `LicenseStore` trait.
//! Callers receive owned copies of records and never hold references into
//! the store across operations.
//!
//! # Backends
//!
//! - `JsonFileStore`: single JSON snapshot file, replaced atomically on every write
//! - `PgLicenseStore`: PostgreSQL table with row-level locking

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppError, models::license::License};

pub mod json_file;
pub mod postgres;

pub use json_file::JsonFileStore;
pub use postgres::PgLicenseStore;

/// Result of applying a mutator inside `LicenseStore::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The record changed and must be persisted.
    Changed,
    /// The record is unchanged; nothing is written.
    Unchanged,
}

/// Closure applied to a record under the store's lock.
///
/// Returning an error aborts the update without writing anything.
pub type Mutator<'a> = Box<dyn FnOnce(&mut License) -> Result<Mutation, AppError> + Send + 'a>;

/// Repository for license records.
///
/// Implementations must serialize `insert`, `update` and `remove` so that a
/// mutator always sees the latest committed state of its record and no
/// concurrent write is lost.
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// All licenses in insertion order.
    async fn list_all(&self) -> Result<Vec<License>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<License>, AppError>;

    /// Case-insensitive key lookup.
    async fn find_by_key(&self, key: &str) -> Result<Option<License>, AppError>;

    /// Store a new license.
    ///
    /// # Errors
    ///
    /// - `DuplicateKey`: another license already uses this key
    /// - `Storage`: persistence failed, nothing was stored
    async fn insert(&self, license: License) -> Result<(), AppError>;

    /// Atomically read, mutate and persist one license.
    ///
    /// # Errors
    ///
    /// - `LicenseNotFound`: no license with this id
    /// - any error returned by the mutator (nothing is written)
    /// - `Storage`: persistence failed, the previous state is kept
    async fn update(
        &self,
        id: Uuid,
        mutator: Mutator<'_>,
    ) -> Result<(License, Mutation), AppError>;

    /// Permanently delete a license.
    async fn remove(&self, id: Uuid) -> Result<License, AppError>;

    /// Verify the backend is reachable.
    async fn check_health(&self) -> Result<(), AppError>;
}
