//! Sync engine driving cursor-based block processing.
//!
//! Each tick fetches at most `max_blocks_per_run` blocks past the stored
//! cursor, applies every decoded event, then advances the cursor. Fetching,
//! processing and the cursor write are all-or-nothing per tick: a failure
//! leaves the cursor where it was and the range is retried on the next tick.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::listener::provider::EventSource;
use crate::processor;
use crate::storage::Storage;

/// Backoff after a failed tick before retrying.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Result of a single sync tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The cursor already matches the chain head; nothing to do.
    AtHead {
        /// Chain head observed during the tick
        head: u64,
    },
    /// A block range was fetched, applied and committed.
    Processed {
        /// First block of the range, inclusive
        from_block: u64,
        /// Last block of the range, inclusive
        to_block: u64,
        /// Number of events applied across all registries
        events: usize,
    },
}

/// Sync engine for one chain.
pub struct SyncEngine<P: EventSource> {
    source: P,
    storage: Storage,
    config: SyncConfig,
    chain_id: u64,
}

impl<P: EventSource> SyncEngine<P> {
    /// Create a new sync engine.
    pub fn new(source: P, storage: Storage, config: SyncConfig, chain_id: u64) -> Self {
        Self {
            source,
            storage,
            config,
            chain_id,
        }
    }

    /// Process the next block range, if any.
    ///
    /// The range starts one past the stored cursor and is capped at
    /// `max_blocks_per_run` blocks, never extending beyond the chain head.
    /// The cursor only advances after every event in the range is stored.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let cursor = self
            .storage
            .get_or_init_cursor(self.chain_id, self.config.start_block)
            .await?;
        let head = self.source.chain_head().await?;

        let from_block = cursor.last_processed_block + 1;
        if from_block > head {
            return Ok(TickOutcome::AtHead { head });
        }

        let to_block = head.min(from_block.saturating_add(self.config.max_blocks_per_run - 1));

        let events = self
            .source
            .fetch_events(from_block, to_block)
            .await
            .with_context(|| {
                format!(
                    "Failed to fetch events for blocks {} to {}",
                    from_block, to_block
                )
            })?;
        let count = events.len();

        processor::apply(&self.storage, events).await?;

        self.storage.advance_cursor(self.chain_id, to_block).await?;

        Ok(TickOutcome::Processed {
            from_block,
            to_block,
            events: count,
        })
    }

    /// Run the sync loop indefinitely.
    ///
    /// Full batches are followed by an immediate tick (historical catch-up);
    /// partial batches and at-head ticks wait out the poll interval. Failed
    /// ticks are logged and retried after a short backoff.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Sync engine starting: chain_id={}, start_block={}, max_blocks_per_run={}",
            self.chain_id, self.config.start_block, self.config.max_blocks_per_run
        );

        loop {
            match self.tick().await {
                Ok(TickOutcome::AtHead { head }) => {
                    debug!(
                        "At chain head (block {}), waiting {} seconds",
                        head, self.config.poll_interval_secs
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
                }
                Ok(TickOutcome::Processed {
                    from_block,
                    to_block,
                    events,
                }) => {
                    info!(
                        "Processed blocks {} to {} ({} events)",
                        from_block, to_block, events
                    );

                    // A full batch means more history is likely waiting.
                    let batch_len = to_block - from_block + 1;
                    if batch_len < self.config.max_blocks_per_run {
                        tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs))
                            .await;
                    }
                }
                Err(e) => {
                    error!("Sync tick failed: {:#}", e);
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }
}
