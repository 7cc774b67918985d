//! Schema storage operations.

use super::types::{parse_address, parse_b256};
use super::{SchemaRecord, Storage};
use agenttrust_core::{address_hex, bytes32_hex};
use alloy::primitives::B256;
use anyhow::{Context, Result};
use sqlx::Row;

impl Storage {
    /// Insert or update a schema definition, keyed by schema id.
    ///
    /// The conflict branch rewrites the descriptor fields; `created_at` and
    /// `active` keep their first-seen values.
    pub async fn upsert_schema(&self, record: &SchemaRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO schemas (
                id, creator, name, version,
                schema_cid, created_at, active, tx_hash
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                creator = excluded.creator,
                name = excluded.name,
                version = excluded.version,
                schema_cid = excluded.schema_cid,
                tx_hash = excluded.tx_hash
            "#,
        )
        .bind(bytes32_hex(&record.id))
        .bind(address_hex(&record.creator))
        .bind(&record.name)
        .bind(&record.version)
        .bind(&record.schema_cid)
        .bind(record.created_at)
        .bind(record.active)
        .bind(bytes32_hex(&record.tx_hash))
        .execute(&self.pool)
        .await
        .context("Failed to upsert schema")?;

        Ok(())
    }

    /// Get a schema by id.
    pub async fn get_schema(&self, id: &B256) -> Result<Option<SchemaRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, creator, name, version,
                   schema_cid, created_at, active, tx_hash
            FROM schemas
            WHERE id = ?
            "#,
        )
        .bind(bytes32_hex(id))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch schema")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_schema_record(row)?)),
            None => Ok(None),
        }
    }

    fn row_to_schema_record(row: sqlx::sqlite::SqliteRow) -> Result<SchemaRecord> {
        let id: String = row.get("id");
        let creator: String = row.get("creator");
        let tx_hash: String = row.get("tx_hash");

        Ok(SchemaRecord {
            id: parse_b256(&id)?,
            creator: parse_address(&creator)?,
            name: row.get("name"),
            version: row.get("version"),
            schema_cid: row.get("schema_cid"),
            created_at: row.get("created_at"),
            active: row.get("active"),
            tx_hash: parse_b256(&tx_hash)?,
        })
    }
}
