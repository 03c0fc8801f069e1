//! Time-bounded record cache with single-flight refresh.
//!
//! [`RecordCache`] owns the current [`CacheEnvelope`] as an `Arc` swapped
//! under a short-lived lock, so readers always see a complete collection.
//!
//! # Load path
//!
//! ```text
//! load() ── fresh? ──yes──▶ shared snapshot
//!              │no
//!              ▼
//!       fetch lock (one fetch in flight)
//!              │
//!       restore persisted envelope (first time only)
//!              │
//!        fresh now? ──yes──▶ snapshot another caller fetched
//!              │no
//!              ▼
//!       source.fetch_all_records() ──err──▶ error, state untouched
//!              │ok
//!              ▼
//!       swap snapshot, persist envelope (failure only warned)
//! ```
//!
//! [`invalidate`](RecordCache::invalidate) bumps a generation counter. An
//! envelope is fresh only while it is younger than the TTL *and* was fetched
//! under the current generation, so an invalidation that lands during an
//! in-flight fetch also marks that fetch's result stale.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use flora_catalog_core::envelope::{CacheEnvelope, CACHE_KEY, CACHE_TTL_MS};
use flora_catalog_core::models::PlantRecord;
use flora_catalog_core::store::{KeyValueStore, RecordSource};

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    /// Current time as Unix milliseconds.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct CacheState {
    envelope: Option<Arc<CacheEnvelope>>,
    /// Bumped by every invalidation.
    generation: u64,
    /// Generation current when `envelope` was fetched.
    envelope_generation: u64,
    restored: bool,
    /// Completed fetch attempts, successful or not.
    attempts: u64,
    last_failure: Option<String>,
}

pub struct RecordCache {
    source: Arc<dyn RecordSource>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
    state: RwLock<CacheState>,
    fetch_lock: tokio::sync::Mutex<()>,
}

impl RecordCache {
    pub fn new(source: Arc<dyn RecordSource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            source,
            store,
            clock: Arc::new(SystemClock),
            ttl_ms: CACHE_TTL_MS,
            state: RwLock::new(CacheState::default()),
            fetch_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Return the cached collection if fresh, otherwise fetch it.
    ///
    /// Callers that arrive while a fetch is in flight wait for it and share
    /// its outcome, including its error.
    pub async fn load(&self) -> Result<Arc<CacheEnvelope>> {
        if let Some(envelope) = self.fresh_snapshot() {
            debug!(records = envelope.records.len(), "cache hit");
            return Ok(envelope);
        }

        let attempts_before = self.read_state().attempts;
        let _guard = self.fetch_lock.lock().await;

        self.restore().await;
        if let Some(envelope) = self.fresh_snapshot() {
            debug!(records = envelope.records.len(), "cache filled while waiting");
            return Ok(envelope);
        }
        {
            let state = self.read_state();
            if state.attempts != attempts_before {
                if let Some(failure) = &state.last_failure {
                    bail!("{}", failure);
                }
            }
        }

        self.fetch().await
    }

    /// Force the next [`load`](Self::load) to refetch.
    pub fn invalidate(&self) {
        let mut state = self.write_state();
        state.generation += 1;
        debug!(generation = state.generation, "cache invalidated");
    }

    /// Whether a [`load`](Self::load) right now would be served from memory.
    pub fn is_fresh(&self) -> bool {
        self.fresh_snapshot().is_some()
    }

    /// Last successfully fetched collection, fresh or not.
    pub fn snapshot(&self) -> Option<Arc<CacheEnvelope>> {
        self.read_state().envelope.clone()
    }

    fn fresh_snapshot(&self) -> Option<Arc<CacheEnvelope>> {
        let now = self.clock.now_millis();
        let state = self.read_state();
        state
            .envelope
            .as_ref()
            .filter(|e| {
                state.envelope_generation == state.generation && e.is_fresh(now, self.ttl_ms)
            })
            .cloned()
    }

    /// Adopt the persisted envelope once, if memory is still empty.
    ///
    /// Runs under the fetch lock.
    async fn restore(&self) {
        if self.read_state().restored {
            return;
        }
        let raw = match self.store.get(CACHE_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "could not read persisted cache");
                None
            }
        };
        let mut state = self.write_state();
        state.restored = true;
        if state.envelope.is_some() {
            return;
        }
        match raw.as_deref().map(CacheEnvelope::from_stored) {
            Some(Some(envelope)) => {
                debug!(
                    records = envelope.records.len(),
                    fetched_at = envelope.fetched_at,
                    "restored persisted cache"
                );
                state.envelope = Some(Arc::new(envelope));
                // Generation zero: any invalidation before now makes it stale.
                state.envelope_generation = 0;
            }
            Some(None) => warn!("discarding unreadable persisted cache"),
            None => {}
        }
    }

    async fn fetch(&self) -> Result<Arc<CacheEnvelope>> {
        let generation = self.read_state().generation;
        info!("fetching plant collection");

        let fetched = self
            .source
            .fetch_all_records()
            .await
            .context("Failed to fetch plant records");

        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                let mut state = self.write_state();
                state.attempts += 1;
                state.last_failure = Some(format!("{:#}", e));
                warn!(error = %format!("{:#}", e), "fetch failed, keeping previous cache");
                return Err(e);
            }
        };

        let records = keep_valid(records);
        let envelope = Arc::new(CacheEnvelope::new(records, self.clock.now_millis()));
        {
            let mut state = self.write_state();
            state.envelope = Some(envelope.clone());
            state.envelope_generation = generation;
            state.attempts += 1;
            state.last_failure = None;
        }
        info!(records = envelope.records.len(), "plant collection cached");

        match envelope.to_stored() {
            Ok(raw) => {
                if let Err(e) = self.store.set(CACHE_KEY, &raw).await {
                    warn!(error = %e, "could not persist cache");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize cache"),
        }

        Ok(envelope)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop records without a scientific name.
fn keep_valid(records: Vec<PlantRecord>) -> Vec<PlantRecord> {
    let total = records.len();
    let kept: Vec<PlantRecord> = records
        .into_iter()
        .filter(|r| !r.scientific_name.trim().is_empty())
        .collect();
    if kept.len() != total {
        warn!(
            skipped = total - kept.len(),
            "skipped records without a scientific name"
        );
    }
    kept
}
