//! Catalog session.
//!
//! A [`Catalog`] is the state one user interacts with: the record cache, the
//! favorite set, the comparison selection, the supplemental chart series and
//! the memoized category/location catalogs. The CLI builds one per command;
//! the HTTP server shares one across requests.
//!
//! Every mutation that goes through the record source (create, update,
//! delete, image changes) invalidates the cache so the next read refetches.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use flora_catalog_core::compare::{ComparisonSelection, ComparisonTable, SelectionChange};
use flora_catalog_core::envelope::CacheEnvelope;
use flora_catalog_core::favorites::{FavoriteSet, FAVORITES_KEY};
use flora_catalog_core::models::{Category, Location, PlantInput, PlantRecord};
use flora_catalog_core::query::FilterSpec;
use flora_catalog_core::stats::{
    aggregate, summarize, AggregateStatistics, CatalogSummary, StaticSeries, SupplementalSeries,
};
use flora_catalog_core::store::{KeyValueStore, RecordSource};
use flora_catalog_core::view::{build_view, discover_options, FilterOptions};

use crate::cache::{Clock, RecordCache};
use crate::config::Config;
use crate::http_source::HttpRecordSource;
use crate::sqlite_kv::SqliteKeyValueStore;
use crate::{db, migrate};

pub struct Catalog {
    cache: RecordCache,
    source: Arc<dyn RecordSource>,
    store: Arc<dyn KeyValueStore>,
    series: Arc<dyn SupplementalSeries>,
    favorites: RwLock<FavoriteSet>,
    comparison: RwLock<ComparisonSelection>,
    categories: OnceCell<Vec<Category>>,
    locations: OnceCell<Vec<Location>>,
}

impl Catalog {
    /// Open a session, restoring favorites from `store`.
    pub async fn open(
        source: Arc<dyn RecordSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let stored = match store.get(FAVORITES_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "could not read favorites, starting empty");
                None
            }
        };
        let favorites = FavoriteSet::from_stored(stored.as_deref());

        Ok(Self {
            cache: RecordCache::new(source.clone(), store.clone()),
            source,
            store,
            series: Arc::new(StaticSeries::placeholder()),
            favorites: RwLock::new(favorites),
            comparison: RwLock::new(ComparisonSelection::new()),
            categories: OnceCell::new(),
            locations: OnceCell::new(),
        })
    }

    /// Open a session against the configured REST backend and SQLite store.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        let source = Arc::new(HttpRecordSource::new(&config.source)?);
        let store = Arc::new(SqliteKeyValueStore::new(pool));
        Ok(Self::open(source, store)
            .await?
            .with_ttl_ms(config.cache.ttl_ms()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = self.cache.with_clock(clock);
        self
    }

    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.cache = self.cache.with_ttl_ms(ttl_ms);
        self
    }

    pub fn with_series(mut self, series: Arc<dyn SupplementalSeries>) -> Self {
        self.series = series;
        self
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    // ============ Records ============

    pub async fn records(&self) -> Result<Arc<CacheEnvelope>> {
        self.cache.load().await
    }

    /// Invalidate and refetch.
    pub async fn refresh(&self) -> Result<Arc<CacheEnvelope>> {
        self.cache.invalidate();
        self.cache.load().await
    }

    /// Filtered and sorted records for `spec`.
    pub async fn view(&self, spec: &FilterSpec) -> Result<Vec<PlantRecord>> {
        let envelope = self.records().await?;
        let favorites = self.favorites();
        Ok(build_view(&envelope.records, spec, &favorites)
            .into_iter()
            .cloned()
            .collect())
    }

    /// One record, from the cached collection when present, otherwise from
    /// the source.
    pub async fn get(&self, id: i64) -> Result<Option<PlantRecord>> {
        let envelope = self.records().await?;
        if let Some(record) = envelope.records.iter().find(|r| r.id == id) {
            return Ok(Some(record.clone()));
        }
        self.source
            .get_record(id)
            .await
            .with_context(|| format!("Failed to fetch plant {}", id))
    }

    pub async fn statistics(&self) -> Result<AggregateStatistics> {
        let envelope = self.records().await?;
        Ok(aggregate(&envelope.records, self.series.as_ref()))
    }

    pub async fn summary(&self) -> Result<CatalogSummary> {
        let envelope = self.records().await?;
        let categories = self.categories().await?;
        Ok(summarize(
            &envelope.records,
            categories.len(),
            &self.favorites(),
        ))
    }

    pub async fn options(&self) -> Result<FilterOptions> {
        let envelope = self.records().await?;
        Ok(discover_options(&envelope.records))
    }

    async fn contains_plant(&self, id: i64) -> Result<bool> {
        let envelope = self.records().await?;
        Ok(envelope.records.iter().any(|r| r.id == id))
    }

    // ============ Catalog metadata ============

    /// Category catalog, fetched once per session.
    pub async fn categories(&self) -> Result<&[Category]> {
        let categories = self
            .categories
            .get_or_try_init(|| async {
                self.source
                    .fetch_categories()
                    .await
                    .context("Failed to fetch categories")
            })
            .await?;
        Ok(categories)
    }

    /// Location catalog, fetched once per session.
    pub async fn locations(&self) -> Result<&[Location]> {
        let locations = self
            .locations
            .get_or_try_init(|| async {
                self.source
                    .fetch_locations()
                    .await
                    .context("Failed to fetch locations")
            })
            .await?;
        Ok(locations)
    }

    // ============ Favorites ============

    pub fn favorites(&self) -> FavoriteSet {
        self.favorites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.favorites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Toggle `id` and write the full set back. Returns the new membership,
    /// or `None` when `id` is not a favorite and not in the collection.
    ///
    /// Removing a favorite never consults the collection. A failed write is
    /// logged; the in-memory set keeps the change.
    pub async fn toggle_favorite(&self, id: i64) -> Result<Option<bool>> {
        if !self.is_favorite(id) && !self.contains_plant(id).await? {
            return Ok(None);
        }
        let (member, stored) = {
            let mut favorites = self
                .favorites
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let member = favorites.toggle(id);
            (member, favorites.to_stored())
        };
        if let Err(e) = self.store.set(FAVORITES_KEY, &stored).await {
            warn!(error = %e, plant = id, "could not persist favorites");
        }
        Ok(Some(member))
    }

    /// Favorited plants present in the collection, in collection order.
    pub async fn favorite_records(&self) -> Result<Vec<PlantRecord>> {
        let envelope = self.records().await?;
        let favorites = self.favorites();
        Ok(envelope
            .records
            .iter()
            .filter(|r| favorites.contains(r.id))
            .cloned()
            .collect())
    }

    // ============ Comparison ============

    /// Add `id` to the comparison if it is in the collection.
    pub async fn compare_add(&self, id: i64) -> Result<SelectionChange> {
        let envelope = self.records().await?;
        Ok(self.comparison_mut(|sel| sel.add_from(id, &envelope.records)))
    }

    pub fn compare_remove(&self, id: i64) -> SelectionChange {
        self.comparison_mut(|sel| sel.remove(id))
    }

    pub async fn compare_toggle(&self, id: i64) -> Result<SelectionChange> {
        if self.comparison().contains(id) {
            return Ok(self.compare_remove(id));
        }
        self.compare_add(id).await
    }

    pub fn compare_clear(&self) {
        self.comparison_mut(|sel| sel.clear())
    }

    pub fn comparison(&self) -> ComparisonSelection {
        self.comparison
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Comparison table resolved against the full collection.
    pub async fn comparison_table(&self) -> Result<ComparisonTable> {
        let envelope = self.records().await?;
        Ok(self.comparison().comparison_table(&envelope.records))
    }

    fn comparison_mut<T>(&self, f: impl FnOnce(&mut ComparisonSelection) -> T) -> T {
        let mut sel = self
            .comparison
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut sel)
    }

    // ============ Mutations through the source ============

    pub async fn create_record(&self, input: &PlantInput) -> Result<PlantRecord> {
        let record = self
            .source
            .create_record(input)
            .await
            .context("Failed to create plant")?;
        self.cache.invalidate();
        info!(plant = record.id, "plant created");
        Ok(record)
    }

    pub async fn update_record(&self, id: i64, input: &PlantInput) -> Result<PlantRecord> {
        let record = self
            .source
            .update_record(id, input)
            .await
            .with_context(|| format!("Failed to update plant {}", id))?;
        self.cache.invalidate();
        info!(plant = id, "plant updated");
        Ok(record)
    }

    pub async fn delete_record(&self, id: i64) -> Result<()> {
        self.source
            .delete_record(id)
            .await
            .with_context(|| format!("Failed to delete plant {}", id))?;
        self.cache.invalidate();
        self.comparison_mut(|sel| sel.remove(id));
        info!(plant = id, "plant deleted");
        Ok(())
    }

    pub async fn add_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        let images = self
            .source
            .add_image(id, url)
            .await
            .with_context(|| format!("Failed to add image to plant {}", id))?;
        self.cache.invalidate();
        Ok(images)
    }

    pub async fn remove_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        let images = self
            .source
            .remove_image(id, url)
            .await
            .with_context(|| format!("Failed to remove image from plant {}", id))?;
        self.cache.invalidate();
        Ok(images)
    }
}
