//! Standalone revocation storage operations.

use super::types::{parse_address, parse_b256};
use super::{RevocationRecord, Storage};
use agenttrust_core::{address_hex, bytes32_hex};
use alloy::primitives::B256;
use anyhow::{Context, Result};
use sqlx::Row;

impl Storage {
    /// Record a credential revocation, insert-if-absent.
    ///
    /// Returns false when a row already exists for the credential id; the
    /// first observed revocation wins and is never rewritten.
    pub async fn insert_revocation(&self, record: &RevocationRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO revocations (
                credential_id, revoker, revoked_at, reason, tx_hash
            )
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(credential_id) DO NOTHING
            "#,
        )
        .bind(bytes32_hex(&record.credential_id))
        .bind(address_hex(&record.revoker))
        .bind(record.revoked_at)
        .bind(&record.reason)
        .bind(bytes32_hex(&record.tx_hash))
        .execute(&self.pool)
        .await
        .context("Failed to insert revocation")?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a revocation by credential id.
    pub async fn get_revocation(&self, credential_id: &B256) -> Result<Option<RevocationRecord>> {
        let row = sqlx::query(
            r#"
            SELECT credential_id, revoker, revoked_at, reason, tx_hash
            FROM revocations
            WHERE credential_id = ?
            "#,
        )
        .bind(bytes32_hex(credential_id))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch revocation")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_revocation_record(row)?)),
            None => Ok(None),
        }
    }

    fn row_to_revocation_record(row: sqlx::sqlite::SqliteRow) -> Result<RevocationRecord> {
        let credential_id: String = row.get("credential_id");
        let revoker: String = row.get("revoker");
        let tx_hash: String = row.get("tx_hash");

        Ok(RevocationRecord {
            credential_id: parse_b256(&credential_id)?,
            revoker: parse_address(&revoker)?,
            revoked_at: row.get("revoked_at"),
            reason: row.get("reason"),
            tx_hash: parse_b256(&tx_hash)?,
        })
    }
}
