//! PostgreSQL backend.
//!
//! Each license is one row of the `licenses` table; bound devices are kept
//! inline as a JSONB array. `update` locks the row with `FOR UPDATE` inside a
//! transaction, so concurrent activations of the same license are
//! serialized by the database while other licenses proceed in parallel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::{LicenseStore, Mutation, Mutator};
use crate::{
    db::DbPool,
    error::{AppError, StorageError},
    models::license::{Activation, License},
};

/// Raw `licenses` row.
#[derive(Debug, sqlx::FromRow)]
struct LicenseRow {
    id: Uuid,
    key: String,
    owner: String,
    expires_at: Option<DateTime<Utc>>,
    active: bool,
    blocked: bool,
    created_at: DateTime<Utc>,
    max_devices: i32,
    devices: Json<Vec<Activation>>,
}

impl TryFrom<LicenseRow> for License {
    type Error = StorageError;

    fn try_from(row: LicenseRow) -> Result<Self, Self::Error> {
        let max_devices = u32::try_from(row.max_devices)
            .ok()
            .filter(|max| *max >= 1)
            .ok_or_else(|| {
                StorageError::Corrupt(format!(
                    "license {} has max_devices {}",
                    row.id, row.max_devices
                ))
            })?;

        let license = License {
            id: row.id,
            key: row.key,
            owner: row.owner,
            expires_at: row.expires_at,
            active: row.active,
            blocked: row.blocked,
            created_at: row.created_at,
            max_devices,
            devices: row.devices.0,
        };
        license.check_invariants().map_err(StorageError::Corrupt)?;
        Ok(license)
    }
}

/// License store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgLicenseStore {
    pool: DbPool,
}

impl PgLicenseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn max_devices_column(license: &License) -> Result<i32, AppError> {
    i32::try_from(license.max_devices)
        .map_err(|_| AppError::InvalidRequest("maxDevices is too large".to_string()))
}

#[async_trait]
impl LicenseStore for PgLicenseStore {
    async fn list_all(&self) -> Result<Vec<License>, AppError> {
        let rows = sqlx::query_as::<_, LicenseRow>(
            r#"
            SELECT id, key, owner, expires_at, active, blocked, created_at, max_devices, devices
            FROM licenses
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| License::try_from(row).map_err(AppError::from))
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<License>, AppError> {
        let row = sqlx::query_as::<_, LicenseRow>(
            r#"
            SELECT id, key, owner, expires_at, active, blocked, created_at, max_devices, devices
            FROM licenses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(License::try_from).transpose()?)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<License>, AppError> {
        // Keys are stored uppercase, so normalizing the input is enough
        let row = sqlx::query_as::<_, LicenseRow>(
            r#"
            SELECT id, key, owner, expires_at, active, blocked, created_at, max_devices, devices
            FROM licenses
            WHERE key = $1
            "#,
        )
        .bind(License::normalize_key(key))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(License::try_from).transpose()?)
    }

    async fn insert(&self, license: License) -> Result<(), AppError> {
        let max_devices = max_devices_column(&license)?;

        sqlx::query(
            r#"
            INSERT INTO licenses (
                id, key, owner, expires_at, active, blocked, created_at, max_devices, devices
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(license.id)
        .bind(&license.key)
        .bind(&license.owner)
        .bind(license.expires_at)
        .bind(license.active)
        .bind(license.blocked)
        .bind(license.created_at)
        .bind(max_devices)
        .bind(Json(&license.devices))
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateKey,
            other => other.into(),
        })?;

        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        mutator: Mutator<'_>,
    ) -> Result<(License, Mutation), AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE holds the row until commit/rollback
        let row = sqlx::query_as::<_, LicenseRow>(
            r#"
            SELECT id, key, owner, expires_at, active, blocked, created_at, max_devices, devices
            FROM licenses
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(AppError::LicenseNotFound);
        };

        let mut license = License::try_from(row)?;
        let mutation = match mutator(&mut license) {
            Ok(mutation) => mutation,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        if mutation == Mutation::Changed {
            // Only the lifecycle flags and the device set are mutable
            sqlx::query(
                r#"
                UPDATE licenses
                SET active = $1,
                    blocked = $2,
                    devices = $3
                WHERE id = $4
                "#,
            )
            .bind(license.active)
            .bind(license.blocked)
            .bind(Json(&license.devices))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok((license, mutation))
    }

    async fn remove(&self, id: Uuid) -> Result<License, AppError> {
        let row = sqlx::query_as::<_, LicenseRow>(
            r#"
            DELETE FROM licenses
            WHERE id = $1
            RETURNING id, key, owner, expires_at, active, blocked, created_at, max_devices, devices
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::LicenseNotFound)?;

        Ok(License::try_from(row)?)
    }

    async fn check_health(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
