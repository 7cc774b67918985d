//! SQLite-backed record store for the reputation engine.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::SqlitePool;

use agenttrust_core::DelegationScope;
use agenttrust_reputation::{AttestationRecord, DelegationRecord, ReputationStore};

use crate::db;

/// [`ReputationStore`] reading the tables the indexer maintains.
#[derive(Clone)]
pub struct SqliteReputationStore {
    pool: SqlitePool,
}

impl SqliteReputationStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteReputationStore { pool }
    }
}

#[async_trait]
impl ReputationStore for SqliteReputationStore {
    async fn attestations_for_subject(
        &self,
        subject: &str,
    ) -> anyhow::Result<Vec<AttestationRecord>> {
        let rows = db::list_attestations(&self.pool, Some(subject), None).await?;
        Ok(rows
            .into_iter()
            .map(|row| AttestationRecord {
                uid: row.uid,
                schema_id: row.schema_id,
                issuer: row.issuer,
                subject: row.subject,
                issued_at: row.issued_at,
                expires_at: row.expires_at,
                revoked: row.revoked,
            })
            .collect())
    }

    async fn delegations_for_owner(&self, owner: &str) -> anyhow::Result<Vec<DelegationRecord>> {
        let rows = db::list_delegations(&self.pool, Some(owner), None).await?;
        rows.into_iter()
            .map(|row| {
                let scope = row
                    .scope
                    .parse::<u64>()
                    .map(DelegationScope::from)
                    .with_context(|| {
                        format!("Invalid scope {:?} in delegation {}", row.scope, row.id)
                    })?;
                Ok(DelegationRecord {
                    id: row.id,
                    owner: row.owner,
                    agent: row.agent,
                    scope,
                    expires_at: row.expires_at,
                    created_at: row.created_at,
                    revoked: row.revoked,
                })
            })
            .collect()
    }
}
