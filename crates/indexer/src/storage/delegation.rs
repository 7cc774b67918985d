//! Delegation storage operations.

use super::types::{parse_address, parse_b256, parse_scope};
use super::{DelegationRecord, Storage};
use agenttrust_core::{address_hex, bytes32_hex};
use alloy::primitives::B256;
use anyhow::{Context, Result};
use sqlx::Row;

impl Storage {
    /// Insert or update a delegation from a creation event, keyed by id.
    ///
    /// The conflict branch rewrites the grant fields only; `expires_at`,
    /// `created_at`, and revocation state keep their first-seen values.
    pub async fn upsert_delegation(&self, record: &DelegationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delegations (
                id, owner, agent, scope,
                expires_at, created_at, revoked, revoked_at, tx_hash
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner = excluded.owner,
                agent = excluded.agent,
                scope = excluded.scope,
                tx_hash = excluded.tx_hash
            "#,
        )
        .bind(bytes32_hex(&record.id))
        .bind(address_hex(&record.owner))
        .bind(address_hex(&record.agent))
        .bind(record.scope.to_string())
        .bind(record.expires_at)
        .bind(record.created_at)
        .bind(record.revoked)
        .bind(record.revoked_at)
        .bind(bytes32_hex(&record.tx_hash))
        .execute(&self.pool)
        .await
        .context("Failed to upsert delegation")?;

        Ok(())
    }

    /// Mark a delegation revoked.
    ///
    /// Returns false when no row exists for the id.
    pub async fn mark_delegation_revoked(
        &self,
        id: &B256,
        revoked_at: i64,
        tx_hash: &B256,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE delegations
            SET revoked = 1,
                revoked_at = ?,
                tx_hash = ?
            WHERE id = ?
            "#,
        )
        .bind(revoked_at)
        .bind(bytes32_hex(tx_hash))
        .bind(bytes32_hex(id))
        .execute(&self.pool)
        .await
        .context("Failed to mark delegation revoked")?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a delegation by id.
    pub async fn get_delegation(&self, id: &B256) -> Result<Option<DelegationRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, agent, scope,
                   expires_at, created_at, revoked, revoked_at, tx_hash
            FROM delegations
            WHERE id = ?
            "#,
        )
        .bind(bytes32_hex(id))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch delegation")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_delegation_record(row)?)),
            None => Ok(None),
        }
    }

    fn row_to_delegation_record(row: sqlx::sqlite::SqliteRow) -> Result<DelegationRecord> {
        let id: String = row.get("id");
        let owner: String = row.get("owner");
        let agent: String = row.get("agent");
        let scope: String = row.get("scope");
        let tx_hash: String = row.get("tx_hash");

        Ok(DelegationRecord {
            id: parse_b256(&id)?,
            owner: parse_address(&owner)?,
            agent: parse_address(&agent)?,
            scope: parse_scope(&scope)?,
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
            revoked: row.get("revoked"),
            revoked_at: row.get("revoked_at"),
            tx_hash: parse_b256(&tx_hash)?,
        })
    }
}
