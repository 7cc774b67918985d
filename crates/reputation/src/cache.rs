//! Per-subject score memoization.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use alloy_primitives::Address;
use tokio::sync::RwLock;

use crate::types::ReputationScore;

/// How long a computed score stays servable before recomputation.
pub const DEFAULT_SCORE_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    cached_at: Instant,
    score: ReputationScore,
}

/// Time-boxed cache of computed reputation scores, keyed by subject.
///
/// Concurrent lookups for the same subject may both miss and both recompute;
/// the later insert wins. That duplicate work is bounded by the TTL.
pub struct ScoreCache {
    ttl: Duration,
    entries: RwLock<HashMap<Address, CacheEntry>>,
}

impl ScoreCache {
    /// Create a cache with the given entry lifetime.
    pub fn new(ttl: Duration) -> Self {
        ScoreCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached score for `subject` if it is still fresh.
    pub async fn get(&self, subject: &Address) -> Option<ReputationScore> {
        let entries = self.entries.read().await;
        entries
            .get(subject)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.score.clone())
    }

    /// Store a freshly computed score, replacing any prior entry.
    pub async fn insert(&self, subject: Address, score: ReputationScore) {
        let mut entries = self.entries.write().await;
        entries.insert(
            subject,
            CacheEntry {
                cached_at: Instant::now(),
                score,
            },
        );
    }
}

impl Default for ScoreCache {
    fn default() -> Self {
        ScoreCache::new(DEFAULT_SCORE_TTL)
    }
}
