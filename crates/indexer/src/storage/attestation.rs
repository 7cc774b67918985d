//! Attestation storage operations.

use super::types::{parse_address, parse_b256};
use super::{AttestationRecord, Storage};
use agenttrust_core::{address_hex, bytes32_hex};
use alloy::primitives::B256;
use anyhow::{Context, Result};
use sqlx::Row;

impl Storage {
    /// Insert or update an attestation from an issuance event, keyed by uid.
    ///
    /// The conflict branch leaves `issued_at`, `expires_at`,
    /// `revoked`, and `revoked_at` untouched: a re-delivered issuance must
    /// not resurrect a revoked attestation or rewrite its issuance times.
    pub async fn upsert_attestation(&self, record: &AttestationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attestations (
                uid, schema_id, issuer, subject,
                issued_at, expires_at, data_cid,
                revoked, revoked_at, tx_hash, block_number
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(uid) DO UPDATE SET
                schema_id = excluded.schema_id,
                issuer = excluded.issuer,
                subject = excluded.subject,
                data_cid = excluded.data_cid,
                tx_hash = excluded.tx_hash,
                block_number = excluded.block_number
            "#,
        )
        .bind(bytes32_hex(&record.uid))
        .bind(bytes32_hex(&record.schema_id))
        .bind(address_hex(&record.issuer))
        .bind(address_hex(&record.subject))
        .bind(record.issued_at)
        .bind(record.expires_at)
        .bind(&record.data_cid)
        .bind(record.revoked)
        .bind(record.revoked_at)
        .bind(bytes32_hex(&record.tx_hash))
        .bind(record.block_number as i64)
        .execute(&self.pool)
        .await
        .context("Failed to upsert attestation")?;

        Ok(())
    }

    /// Mark an attestation revoked.
    ///
    /// Returns false when no row exists for the uid; revocation of an
    /// attestation that was never indexed is not an error.
    pub async fn mark_attestation_revoked(
        &self,
        uid: &B256,
        revoked_at: i64,
        tx_hash: &B256,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attestations
            SET revoked = 1,
                revoked_at = ?,
                tx_hash = ?
            WHERE uid = ?
            "#,
        )
        .bind(revoked_at)
        .bind(bytes32_hex(tx_hash))
        .bind(bytes32_hex(uid))
        .execute(&self.pool)
        .await
        .context("Failed to mark attestation revoked")?;

        Ok(result.rows_affected() > 0)
    }

    /// Get an attestation by uid.
    pub async fn get_attestation(&self, uid: &B256) -> Result<Option<AttestationRecord>> {
        let row = sqlx::query(
            r#"
            SELECT uid, schema_id, issuer, subject,
                   issued_at, expires_at, data_cid,
                   revoked, revoked_at, tx_hash, block_number
            FROM attestations
            WHERE uid = ?
            "#,
        )
        .bind(bytes32_hex(uid))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch attestation")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_attestation_record(row)?)),
            None => Ok(None),
        }
    }

    fn row_to_attestation_record(row: sqlx::sqlite::SqliteRow) -> Result<AttestationRecord> {
        let uid: String = row.get("uid");
        let schema_id: String = row.get("schema_id");
        let issuer: String = row.get("issuer");
        let subject: String = row.get("subject");
        let tx_hash: String = row.get("tx_hash");

        Ok(AttestationRecord {
            uid: parse_b256(&uid)?,
            schema_id: parse_b256(&schema_id)?,
            issuer: parse_address(&issuer)?,
            subject: parse_address(&subject)?,
            issued_at: row.get("issued_at"),
            expires_at: row.get("expires_at"),
            data_cid: row.get("data_cid"),
            revoked: row.get("revoked"),
            revoked_at: row.get("revoked_at"),
            tx_hash: parse_b256(&tx_hash)?,
            block_number: row.get::<i64, _>("block_number") as u64,
        })
    }
}
