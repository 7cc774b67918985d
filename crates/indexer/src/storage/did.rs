//! DID (identity) storage operations.

use super::types::{parse_address, parse_b256};
use super::{DidRecord, Storage};
use agenttrust_core::{address_hex, bytes32_hex};
use alloy::primitives::{Address, B256};
use anyhow::{Context, Result};
use sqlx::Row;

impl Storage {
    /// Insert or update an identity record, keyed by owner address.
    ///
    /// The conflict branch rewrites the registration fields only; `active`
    /// and `updated_at` keep their first-seen values.
    pub async fn upsert_did(&self, record: &DidRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO dids (
                id, controller, metadata_cid, active,
                updated_at, tx_hash, block_number
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                controller = excluded.controller,
                metadata_cid = excluded.metadata_cid,
                tx_hash = excluded.tx_hash,
                block_number = excluded.block_number
            "#,
        )
        .bind(address_hex(&record.id))
        .bind(address_hex(&record.controller))
        .bind(&record.metadata_cid)
        .bind(record.active)
        .bind(record.updated_at)
        .bind(bytes32_hex(&record.tx_hash))
        .bind(record.block_number as i64)
        .execute(&self.pool)
        .await
        .context("Failed to upsert DID")?;

        Ok(())
    }

    /// Reassign the controller of an existing identity (recovery path).
    ///
    /// Returns false when no row exists for the address; recovery never
    /// creates identities.
    pub async fn set_did_controller(
        &self,
        id: &Address,
        new_controller: &Address,
        tx_hash: &B256,
        block_number: u64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dids
            SET controller = ?,
                tx_hash = ?,
                block_number = ?
            WHERE id = ?
            "#,
        )
        .bind(address_hex(new_controller))
        .bind(bytes32_hex(tx_hash))
        .bind(block_number as i64)
        .bind(address_hex(id))
        .execute(&self.pool)
        .await
        .context("Failed to update DID controller")?;

        Ok(result.rows_affected() > 0)
    }

    /// Get an identity record by owner address.
    pub async fn get_did(&self, id: &Address) -> Result<Option<DidRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, controller, metadata_cid, active,
                   updated_at, tx_hash, block_number
            FROM dids
            WHERE id = ?
            "#,
        )
        .bind(address_hex(id))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch DID")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_did_record(row)?)),
            None => Ok(None),
        }
    }

    fn row_to_did_record(row: sqlx::sqlite::SqliteRow) -> Result<DidRecord> {
        let id: String = row.get("id");
        let controller: String = row.get("controller");
        let tx_hash: String = row.get("tx_hash");

        Ok(DidRecord {
            id: parse_address(&id)?,
            controller: parse_address(&controller)?,
            metadata_cid: row.get("metadata_cid"),
            active: row.get("active"),
            updated_at: row.get("updated_at"),
            tx_hash: parse_b256(&tx_hash)?,
            block_number: row.get::<i64, _>("block_number") as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    async fn setup_storage() -> (Storage, NamedTempFile) {
        let temp_db = NamedTempFile::new().unwrap();
        let storage = Storage::new_with_path(temp_db.path(), None, None)
            .await
            .unwrap();
        storage.run_migrations().await.unwrap();
        (storage, temp_db)
    }

    fn sample_did() -> DidRecord {
        DidRecord {
            id: Address::repeat_byte(0x01),
            controller: Address::repeat_byte(0x02),
            metadata_cid: "QmIdentityDoc".to_string(),
            active: true,
            updated_at: 1_700_000_000,
            tx_hash: B256::repeat_byte(0xaa),
            block_number: 100,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get_did() {
        let (storage, _temp_db) = setup_storage().await;

        let record = sample_did();
        storage.upsert_did(&record).await.unwrap();

        let fetched = storage.get_did(&record.id).await.unwrap().unwrap();
        assert_eq!(fetched, record);

        assert!(storage
            .get_did(&Address::repeat_byte(0xff))
            .await
            .unwrap()
            .is_none());

        storage.close().await;
    }

    #[tokio::test]
    async fn test_upsert_did_keeps_first_seen_timestamp() {
        let (storage, _temp_db) = setup_storage().await;

        let record = sample_did();
        storage.upsert_did(&record).await.unwrap();

        let mut redelivered = record.clone();
        redelivered.metadata_cid = "QmNewerDoc".to_string();
        redelivered.updated_at = 1_800_000_000;
        redelivered.block_number = 250;
        storage.upsert_did(&redelivered).await.unwrap();

        let fetched = storage.get_did(&record.id).await.unwrap().unwrap();
        assert_eq!(fetched.metadata_cid, "QmNewerDoc");
        assert_eq!(fetched.block_number, 250);
        // Conflict branch does not touch the original timestamp.
        assert_eq!(fetched.updated_at, 1_700_000_000);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_set_did_controller() {
        let (storage, _temp_db) = setup_storage().await;

        let record = sample_did();
        storage.upsert_did(&record).await.unwrap();

        let new_controller = Address::repeat_byte(0x03);
        let updated = storage
            .set_did_controller(&record.id, &new_controller, &B256::repeat_byte(0xbb), 150)
            .await
            .unwrap();
        assert!(updated);

        let fetched = storage.get_did(&record.id).await.unwrap().unwrap();
        assert_eq!(fetched.controller, new_controller);
        assert_eq!(fetched.tx_hash, B256::repeat_byte(0xbb));
        assert_eq!(fetched.block_number, 150);
        assert_eq!(fetched.metadata_cid, record.metadata_cid);

        // Recovery for an address that was never registered is a no-op.
        let updated = storage
            .set_did_controller(
                &Address::repeat_byte(0xee),
                &new_controller,
                &B256::repeat_byte(0xcc),
                151,
            )
            .await
            .unwrap();
        assert!(!updated);

        storage.close().await;
    }
}
