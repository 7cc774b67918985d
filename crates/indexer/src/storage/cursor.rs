//! Sync cursor storage operations.

use super::{Storage, SyncCursor};
use anyhow::{Context, Result};
use sqlx::Row;

impl Storage {
    /// Get the cursor for a chain, creating it at `start_block` if absent.
    ///
    /// A fresh cursor at `start_block` means the first fetched block is
    /// `start_block + 1`.
    pub async fn get_or_init_cursor(&self, chain_id: u64, start_block: u64) -> Result<SyncCursor> {
        if let Some(cursor) = self.get_cursor(chain_id).await? {
            return Ok(cursor);
        }

        sqlx::query(
            r#"
            INSERT INTO indexer_cursor (chain_id, last_processed_block)
            VALUES (?, ?)
            "#,
        )
        .bind(chain_id as i64)
        .bind(start_block as i64)
        .execute(&self.pool)
        .await
        .context("Failed to initialize sync cursor")?;

        Ok(SyncCursor {
            chain_id,
            last_processed_block: start_block,
        })
    }

    /// Get the cursor for a chain if one exists.
    pub async fn get_cursor(&self, chain_id: u64) -> Result<Option<SyncCursor>> {
        let row = sqlx::query(
            r#"
            SELECT chain_id, last_processed_block
            FROM indexer_cursor
            WHERE chain_id = ?
            "#,
        )
        .bind(chain_id as i64)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch sync cursor")?;

        Ok(row.map(|row| SyncCursor {
            chain_id: row.get::<i64, _>("chain_id") as u64,
            last_processed_block: row.get::<i64, _>("last_processed_block") as u64,
        }))
    }

    /// List all cursors, one per indexed chain.
    pub async fn list_cursors(&self) -> Result<Vec<SyncCursor>> {
        let rows = sqlx::query(
            r#"
            SELECT chain_id, last_processed_block
            FROM indexer_cursor
            ORDER BY chain_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sync cursors")?;

        Ok(rows
            .into_iter()
            .map(|row| SyncCursor {
                chain_id: row.get::<i64, _>("chain_id") as u64,
                last_processed_block: row.get::<i64, _>("last_processed_block") as u64,
            })
            .collect())
    }

    /// Advance the cursor for a chain. Never moves it backwards.
    pub async fn advance_cursor(&self, chain_id: u64, block_number: u64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE indexer_cursor
            SET last_processed_block = ?
            WHERE chain_id = ? AND last_processed_block < ?
            "#,
        )
        .bind(block_number as i64)
        .bind(chain_id as i64)
        .bind(block_number as i64)
        .execute(&self.pool)
        .await
        .context("Failed to advance sync cursor")?;

        Ok(())
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

    #[tokio::test]
    async fn test_cursor_initialization() {
        let (storage, _temp_db) = setup_storage().await;

        assert!(storage.get_cursor(11155111).await.unwrap().is_none());

        let cursor = storage.get_or_init_cursor(11155111, 100).await.unwrap();
        assert_eq!(cursor.chain_id, 11155111);
        assert_eq!(cursor.last_processed_block, 100);

        // A second init with a different start block returns the stored row.
        let cursor = storage.get_or_init_cursor(11155111, 9999).await.unwrap();
        assert_eq!(cursor.last_processed_block, 100);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_cursor_advances_monotonically() {
        let (storage, _temp_db) = setup_storage().await;

        storage.get_or_init_cursor(1, 100).await.unwrap();

        storage.advance_cursor(1, 600).await.unwrap();
        let cursor = storage.get_cursor(1).await.unwrap().unwrap();
        assert_eq!(cursor.last_processed_block, 600);

        // Moving backwards is a no-op.
        storage.advance_cursor(1, 300).await.unwrap();
        let cursor = storage.get_cursor(1).await.unwrap().unwrap();
        assert_eq!(cursor.last_processed_block, 600);

        // Re-applying the same block is a no-op.
        storage.advance_cursor(1, 600).await.unwrap();
        let cursor = storage.get_cursor(1).await.unwrap().unwrap();
        assert_eq!(cursor.last_processed_block, 600);

        storage.close().await;
    }

    #[tokio::test]
    async fn test_cursors_are_independent_per_chain() {
        let (storage, _temp_db) = setup_storage().await;

        storage.get_or_init_cursor(1, 0).await.unwrap();
        storage.get_or_init_cursor(11155111, 500).await.unwrap();

        storage.advance_cursor(1, 42).await.unwrap();

        let mainnet = storage.get_cursor(1).await.unwrap().unwrap();
        let sepolia = storage.get_cursor(11155111).await.unwrap().unwrap();
        assert_eq!(mainnet.last_processed_block, 42);
        assert_eq!(sepolia.last_processed_block, 500);

        let all = storage.list_cursors().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].chain_id, 1);
        assert_eq!(all[1].chain_id, 11155111);

        storage.close().await;
    }
}
