//! Persisted record-cache envelope.
//!
//! The full record collection is stored together with the time it was fetched,
//! as a single JSON document under [`CACHE_KEY`]:
//!
//! ```json
//! { "records": [ { "id": 1, "scientific_name": "..." } ], "fetched_at_epoch_millis": 1718000000000 }
//! ```
//!
//! An envelope is fresh while `now - timestamp < ttl`. Unreadable envelopes
//! are treated as absent, never as an error.

use serde::{Deserialize, Serialize};

use crate::models::PlantRecord;

/// Freshness window in milliseconds (5 minutes).
pub const CACHE_TTL_MS: i64 = 300_000;

/// Key/value store key holding the serialized envelope.
pub const CACHE_KEY: &str = "cachedPlantsEnvelope";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    #[serde(alias = "data")]
    pub records: Vec<PlantRecord>,
    /// Fetch time, Unix milliseconds.
    #[serde(rename = "fetched_at_epoch_millis", alias = "timestamp")]
    pub fetched_at: i64,
}

impl CacheEnvelope {
    pub fn new(records: Vec<PlantRecord>, fetched_at: i64) -> Self {
        Self {
            records,
            fetched_at,
        }
    }

    /// Strictly younger than `ttl_ms` at `now_ms`.
    ///
    /// An envelope stamped in the future (clock skew) counts as fresh.
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.fetched_at) < ttl_ms
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.fetched_at).max(0)
    }

    pub fn to_stored(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored envelope. Malformed data yields `None`.
    pub fn from_stored(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
