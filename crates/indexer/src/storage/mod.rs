//! SQLite persistence for indexed registry state.
//!
//! One submodule per table: identities, schemas, attestations, delegations,
//! standalone revocations, and the per-chain sync cursor. All writes are
//! keyed by on-chain identifiers, so replaying a block range is idempotent.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub mod attestation;
pub mod cursor;
pub mod delegation;
pub mod did;
pub mod revocation;
pub mod schema;
pub mod types;

pub use types::*;

/// Pooled handle to the indexer database.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (creating if missing) the database at `database_url`, e.g.
    /// "sqlite://agenttrust.db". Pool bounds default to 5/1 when not given.
    pub async fn new(
        database_url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.unwrap_or(5))
            .min_connections(min_connections.unwrap_or(1))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {}", database_url))?;

        info!("Database opened: {}", database_url);

        Ok(Self { pool })
    }

    /// Open the database at a filesystem path instead of a URL.
    pub async fn new_with_path<P: AsRef<Path>>(
        path: P,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self> {
        let database_url = format!("sqlite://{}", path.as_ref().display());
        Self::new(&database_url, max_connections, min_connections).await
    }

    /// Bring the schema up to date. Call once after opening.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Migrations applied");

        Ok(())
    }

    /// The underlying pool, for callers composing their own queries or
    /// transactions.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Row counts for every indexed table.
    pub async fn stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            did_count: self.count("dids").await?,
            schema_count: self.count("schemas").await?,
            attestation_count: self.count("attestations").await?,
            delegation_count: self.count("delegations").await?,
            revocation_count: self.count("revocations").await?,
        })
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }

    /// Verify the database answers a trivial query.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;

        Ok(())
    }
}

/// Row counts per indexed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Identity records.
    pub did_count: u64,

    /// Schema definitions.
    pub schema_count: u64,

    /// Attestations, revoked ones included.
    pub attestation_count: u64,

    /// Delegations, revoked ones included.
    pub delegation_count: u64,

    /// Standalone credential revocations.
    pub revocation_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn opens_migrates_and_answers() {
        let temp_db = NamedTempFile::new().unwrap();

        let storage = Storage::new_with_path(temp_db.path(), None, None)
            .await
            .unwrap();
        storage.run_migrations().await.unwrap();
        storage.health_check().await.unwrap();

        storage.close().await;
    }

    #[tokio::test]
    async fn fresh_database_has_empty_stats() {
        let temp_db = NamedTempFile::new().unwrap();

        let storage = Storage::new_with_path(temp_db.path(), None, None)
            .await
            .unwrap();
        storage.run_migrations().await.unwrap();

        let stats = storage.stats().await.unwrap();
        assert_eq!(
            stats,
            DatabaseStats {
                did_count: 0,
                schema_count: 0,
                attestation_count: 0,
                delegation_count: 0,
                revocation_count: 0,
            }
        );

        storage.close().await;
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let temp_db = NamedTempFile::new().unwrap();

        let storage = Storage::new_with_path(temp_db.path(), None, None)
            .await
            .unwrap();
        storage.run_migrations().await.unwrap();
        storage.run_migrations().await.unwrap();

        storage.close().await;
    }
}
