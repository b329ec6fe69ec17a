use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::MatchCriteria;
use crate::models::JobPosting;

/// In-process cache of model scores
///
/// Keys are built with [`CacheKey`]; values are canonical 0-1 scores. Entries
/// expire after the configured TTL so a changed prompt or model eventually
/// takes effect without a restart.
#[derive(Clone)]
pub struct ScoreCache {
    inner: moka::future::Cache<String, f64>,
}

impl ScoreCache {
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = moka::future::CacheBuilder::new(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<f64> {
        let hit = self.inner.get(key).await;
        if hit.is_some() {
            tracing::trace!("Score cache hit: {}", key);
        }
        hit
    }

    pub async fn insert(&self, key: String, score: f64) {
        tracing::trace!("Score cache set: {}", key);
        self.inner.insert(key, score).await;
    }

    pub async fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            entries: self.inner.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a model score of one posting under one keyword set
    pub fn model_score(model: &str, posting: &JobPosting, criteria: &MatchCriteria) -> String {
        format!(
            "score:{}:{}:{}",
            model,
            posting.fingerprint(),
            criteria.keywords().join(",")
        )
    }
}
