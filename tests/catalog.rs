//! Session and cache behavior against in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use flora_catalog::cache::ManualClock;
use flora_catalog::catalog::Catalog;
use flora_catalog_core::compare::SelectionChange;
use flora_catalog_core::envelope::{CacheEnvelope, CACHE_KEY};
use flora_catalog_core::favorites::FAVORITES_KEY;
use flora_catalog_core::models::{Category, Habit, Location, PlantInput, PlantRecord, RedListStatus};
use flora_catalog_core::query::{FilterSpec, SortKey};
use flora_catalog_core::stats::{EnvironmentReading, MonthlyCount, SupplementalSeries, TraitValue};
use flora_catalog_core::store::memory::{InMemoryKeyValueStore, InMemoryRecordSource};
use flora_catalog_core::store::{KeyValueStore, RecordSource};

fn plant(id: i64, name: &str, habit: &str, status: &str) -> PlantRecord {
    let mut p = PlantRecord::new(id, name);
    p.habit = Some(Habit::from(habit.to_string()));
    p.red_list_category = Some(RedListStatus::from(status.to_string()));
    p
}

fn two_plants() -> Vec<PlantRecord> {
    vec![
        plant(1, "Ficus religiosa", "Tree", "LC"),
        plant(2, "Acacia nilotica", "Tree", "CR"),
    ]
}

struct Fixture {
    source: Arc<InMemoryRecordSource>,
    store: Arc<InMemoryKeyValueStore>,
    clock: Arc<ManualClock>,
    catalog: Catalog,
}

async fn fixture(records: Vec<PlantRecord>) -> Fixture {
    let source = Arc::new(InMemoryRecordSource::new(records).with_catalog(
        vec![
            Category {
                id: 1,
                name: "Sacred".into(),
            },
            Category {
                id: 2,
                name: "Medicinal".into(),
            },
        ],
        vec![Location {
            id: 1,
            name: "Western Ghats".into(),
        }],
    ));
    let store = Arc::new(InMemoryKeyValueStore::new());
    let clock = Arc::new(ManualClock::new(0));
    let catalog = Catalog::open(source.clone(), store.clone())
        .await
        .unwrap()
        .with_clock(clock.clone());
    Fixture {
        source,
        store,
        clock,
        catalog,
    }
}

/// Source that reads the collection, then takes a while to answer, so
/// concurrent loads overlap.
struct SlowSource {
    inner: InMemoryRecordSource,
    delay: Duration,
}

#[async_trait]
impl RecordSource for SlowSource {
    async fn fetch_all_records(&self) -> Result<Vec<PlantRecord>> {
        let fetched = self.inner.fetch_all_records().await;
        tokio::time::sleep(self.delay).await;
        fetched
    }
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.inner.fetch_categories().await
    }
    async fn fetch_locations(&self) -> Result<Vec<Location>> {
        self.inner.fetch_locations().await
    }
    async fn get_record(&self, id: i64) -> Result<Option<PlantRecord>> {
        self.inner.get_record(id).await
    }
    async fn create_record(&self, input: &PlantInput) -> Result<PlantRecord> {
        self.inner.create_record(input).await
    }
    async fn update_record(&self, id: i64, input: &PlantInput) -> Result<PlantRecord> {
        self.inner.update_record(id, input).await
    }
    async fn delete_record(&self, id: i64) -> Result<()> {
        self.inner.delete_record(id).await
    }
    async fn add_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        self.inner.add_image(id, url).await
    }
    async fn remove_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        self.inner.remove_image(id, url).await
    }
}

// ============ Cache ============

#[tokio::test]
async fn test_refetch_only_after_ttl() {
    let f = fixture(two_plants()).await;

    f.catalog.records().await.unwrap();
    assert_eq!(f.source.fetch_count(), 1);

    f.clock.set(200_000);
    f.catalog.records().await.unwrap();
    assert_eq!(f.source.fetch_count(), 1, "fresh cache must not refetch");

    f.clock.set(400_000);
    f.catalog.records().await.unwrap();
    assert_eq!(f.source.fetch_count(), 2, "stale cache must refetch");
}

#[tokio::test]
async fn test_refresh_bypasses_ttl() {
    let f = fixture(two_plants()).await;
    f.catalog.records().await.unwrap();
    f.source.replace_records(vec![plant(3, "Cassia fistula", "Tree", "LC")]);
    let envelope = f.catalog.refresh().await.unwrap();
    assert_eq!(f.source.fetch_count(), 2);
    assert_eq!(envelope.records[0].id, 3);
}

#[tokio::test]
async fn test_single_flight() {
    let source = Arc::new(SlowSource {
        inner: InMemoryRecordSource::new(two_plants()),
        delay: Duration::from_millis(50),
    });
    let catalog = Arc::new(
        Catalog::open(source.clone(), Arc::new(InMemoryKeyValueStore::new()))
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let catalog = catalog.clone();
        handles.push(tokio::spawn(async move { catalog.records().await }));
    }
    for handle in handles {
        let envelope = handle.await.unwrap().unwrap();
        assert_eq!(envelope.records.len(), 2);
    }
    assert_eq!(source.inner.fetch_count(), 1);
}

#[tokio::test]
async fn test_waiters_share_a_failed_fetch() {
    let source = Arc::new(SlowSource {
        inner: InMemoryRecordSource::new(two_plants()),
        delay: Duration::from_millis(50),
    });
    source.inner.set_unavailable(true);
    let catalog = Arc::new(
        Catalog::open(source.clone(), Arc::new(InMemoryKeyValueStore::new()))
            .await
            .unwrap(),
    );

    let (a, b, c) = tokio::join!(
        catalog.records(),
        catalog.records(),
        catalog.records()
    );
    assert!(a.is_err() && b.is_err() && c.is_err());
    assert_eq!(source.inner.fetch_count(), 1);

    // A later call is a new attempt.
    source.inner.set_unavailable(false);
    assert!(catalog.records().await.is_ok());
    assert_eq!(source.inner.fetch_count(), 2);
}

#[tokio::test]
async fn test_invalidation_during_fetch_refetches() {
    let source = Arc::new(SlowSource {
        inner: InMemoryRecordSource::new(two_plants()),
        delay: Duration::from_millis(50),
    });
    let catalog = Catalog::open(source.clone(), Arc::new(InMemoryKeyValueStore::new()))
        .await
        .unwrap();

    let (first, refreshed) = tokio::join!(catalog.records(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        source
            .inner
            .replace_records(vec![plant(3, "Cassia fistula", "Tree", "LC")]);
        catalog.refresh().await
    });

    assert_eq!(first.unwrap().records.len(), 2);
    let refreshed = refreshed.unwrap();
    assert_eq!(refreshed.records.len(), 1);
    assert_eq!(refreshed.records[0].id, 3);
    assert_eq!(source.inner.fetch_count(), 2);

    assert!(catalog.cache().is_fresh());
    assert_eq!(catalog.records().await.unwrap().records[0].id, 3);
    assert_eq!(source.inner.fetch_count(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let f = fixture(two_plants()).await;
    f.catalog.records().await.unwrap();

    f.source.set_unavailable(true);
    let err = f.catalog.refresh().await.unwrap_err();
    assert!(format!("{:#}", err).contains("unavailable"));

    let snapshot = f.catalog.cache().snapshot().unwrap();
    assert_eq!(snapshot.records.len(), 2);
    assert_eq!(snapshot.fetched_at, 0);
}

#[tokio::test]
async fn test_successful_fetch_persists_envelope() {
    let f = fixture(two_plants()).await;
    f.clock.set(1_234);
    f.catalog.records().await.unwrap();

    let raw = f.store.get(CACHE_KEY).await.unwrap().unwrap();
    let envelope = CacheEnvelope::from_stored(&raw).unwrap();
    assert_eq!(envelope.fetched_at, 1_234);
    assert_eq!(envelope.records.len(), 2);
}

#[tokio::test]
async fn test_fresh_persisted_envelope_avoids_fetch() {
    let source = Arc::new(InMemoryRecordSource::new(two_plants()));
    let store = Arc::new(InMemoryKeyValueStore::new());
    let persisted = CacheEnvelope::new(vec![PlantRecord::new(9, "Santalum album")], 10_000);
    store
        .set(CACHE_KEY, &persisted.to_stored().unwrap())
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::new(20_000));
    let catalog = Catalog::open(source.clone(), store.clone())
        .await
        .unwrap()
        .with_clock(clock.clone());

    let envelope = catalog.records().await.unwrap();
    assert_eq!(envelope.records[0].id, 9);
    assert_eq!(source.fetch_count(), 0);

    catalog.cache().invalidate();
    let envelope = catalog.records().await.unwrap();
    assert_eq!(envelope.records.len(), 2);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_malformed_persisted_envelope_is_cold_start() {
    let source = Arc::new(InMemoryRecordSource::new(two_plants()));
    let store = Arc::new(InMemoryKeyValueStore::new());
    store.set(CACHE_KEY, "{definitely not json").await.unwrap();

    let catalog = Catalog::open(source.clone(), store.clone()).await.unwrap();
    let envelope = catalog.records().await.unwrap();
    assert_eq!(envelope.records.len(), 2);
    assert_eq!(source.fetch_count(), 1);
}

// ============ View, stats, favorites ============

#[tokio::test]
async fn test_view_sorted_by_status() {
    let f = fixture(two_plants()).await;
    let spec = FilterSpec::default().with_sort(SortKey::ConservationStatus);
    let view = f.catalog.view(&spec).await.unwrap();
    let names: Vec<&str> = view.iter().map(|r| r.scientific_name.as_str()).collect();
    assert_eq!(names, vec!["Acacia nilotica", "Ficus religiosa"]);
}

#[tokio::test]
async fn test_favorites_only_view() {
    let f = fixture(two_plants()).await;
    assert_eq!(f.catalog.toggle_favorite(2).await.unwrap(), Some(true));
    let spec = FilterSpec::default().with_favorites_only(true);
    let view = f.catalog.view(&spec).await.unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].scientific_name, "Acacia nilotica");
}

#[tokio::test]
async fn test_favorites_written_on_every_toggle() {
    let f = fixture(two_plants()).await;
    f.catalog.toggle_favorite(2).await.unwrap();
    assert_eq!(
        f.store.get(FAVORITES_KEY).await.unwrap().as_deref(),
        Some("[2]")
    );
    f.catalog.toggle_favorite(2).await.unwrap();
    assert_eq!(
        f.store.get(FAVORITES_KEY).await.unwrap().as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn test_unknown_plant_cannot_be_favorited() {
    let f = fixture(two_plants()).await;
    assert_eq!(f.catalog.toggle_favorite(999).await.unwrap(), None);
    assert!(!f.catalog.is_favorite(999));
    assert_eq!(f.store.get(FAVORITES_KEY).await.unwrap(), None);
    assert_eq!(f.catalog.summary().await.unwrap().favorites_count, 0);
}

#[tokio::test]
async fn test_favorite_of_deleted_plant_can_be_removed() {
    let f = fixture(two_plants()).await;
    f.catalog.toggle_favorite(2).await.unwrap();
    f.catalog.delete_record(2).await.unwrap();
    assert_eq!(f.catalog.toggle_favorite(2).await.unwrap(), Some(false));
    assert!(f.catalog.favorites().is_empty());
}

#[tokio::test]
async fn test_favorites_restored_by_new_session() {
    let f = fixture(two_plants()).await;
    f.catalog.toggle_favorite(1).await.unwrap();
    f.catalog.toggle_favorite(2).await.unwrap();

    let reopened = Catalog::open(f.source.clone(), f.store.clone())
        .await
        .unwrap();
    assert!(reopened.is_favorite(1));
    assert!(reopened.is_favorite(2));
    let records = reopened.favorite_records().await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_summary_and_statistics() {
    let mut records = two_plants();
    records.push(plant(3, "Pterocarpus santalinus", "Tree", "EN"));
    records[0].location_name = Some("Western Ghats".into());
    let f = fixture(records).await;
    f.catalog.toggle_favorite(3).await.unwrap();

    let summary = f.catalog.summary().await.unwrap();
    assert_eq!(summary.total_plants, 3);
    assert_eq!(summary.endangered_count, 2);
    assert_eq!(summary.categories_count, 2);
    assert_eq!(summary.favorites_count, 1);

    let stats = f.catalog.statistics().await.unwrap();
    assert_eq!(stats.habit_stats.len(), 1);
    assert_eq!(stats.habit_stats[0].value, 3);
    assert_eq!(stats.geographic_distribution.len(), 1);
    assert_eq!(stats.monthly_discoveries.len(), 12);
    assert_eq!(stats, f.catalog.statistics().await.unwrap());
}

#[tokio::test]
async fn test_metadata_is_memoized() {
    let f = fixture(two_plants()).await;
    assert_eq!(f.catalog.categories().await.unwrap().len(), 2);
    f.source.set_unavailable(true);
    assert_eq!(f.catalog.categories().await.unwrap().len(), 2);
    assert!(f.catalog.locations().await.is_err());
}

// ============ Comparison ============

#[tokio::test]
async fn test_comparison_limit() {
    let records = (1..=5)
        .map(|id| plant(id, &format!("Species {}", id), "Herb", "NE"))
        .collect();
    let f = fixture(records).await;
    for id in 1..=4 {
        assert_eq!(f.catalog.compare_add(id).await.unwrap(), SelectionChange::Added);
    }
    assert_eq!(
        f.catalog.compare_add(5).await.unwrap(),
        SelectionChange::LimitReached
    );
    let table = f.catalog.comparison_table().await.unwrap();
    assert_eq!(table.plant_ids, vec![1, 2, 3, 4]);

    f.catalog.compare_clear();
    assert!(f.catalog.comparison().is_empty());
}

#[tokio::test]
async fn test_unknown_ids_do_not_take_comparison_slots() {
    let f = fixture(two_plants()).await;
    for id in 900..904 {
        assert_eq!(
            f.catalog.compare_add(id).await.unwrap(),
            SelectionChange::UnknownPlant
        );
        assert_eq!(
            f.catalog.compare_toggle(id).await.unwrap(),
            SelectionChange::UnknownPlant
        );
    }
    assert!(f.catalog.comparison().is_empty());

    assert_eq!(f.catalog.compare_add(1).await.unwrap(), SelectionChange::Added);
    let table = f.catalog.comparison_table().await.unwrap();
    assert_eq!(table.plant_ids, vec![1]);
}

// ============ Mutations ============

#[tokio::test]
async fn test_mutations_invalidate_cache() {
    let f = fixture(two_plants()).await;
    f.catalog.records().await.unwrap();

    let created = f
        .catalog
        .create_record(&PlantInput {
            scientific_name: "Ocimum tenuiflorum".into(),
            habit: Some(Habit::Herb),
            categories: vec![2],
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!f.catalog.cache().is_fresh());
    let envelope = f.catalog.records().await.unwrap();
    assert_eq!(envelope.records.len(), 3);
    assert_eq!(f.source.fetch_count(), 2);

    let updated = f
        .catalog
        .update_record(
            created.id,
            &PlantInput {
                scientific_name: "Ocimum sanctum".into(),
                red_list_category: Some(RedListStatus::from("VU".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.scientific_name, "Ocimum sanctum");
    assert!(!f.catalog.cache().is_fresh());

    let images = f
        .catalog
        .add_image(created.id, "https://img/tulsi.jpg")
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
    let fetched = f.catalog.get(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.images, vec!["https://img/tulsi.jpg"]);

    f.catalog.compare_add(created.id).await.unwrap();
    f.catalog.delete_record(created.id).await.unwrap();
    assert!(f.catalog.get(created.id).await.unwrap().is_none());
    assert!(!f.catalog.comparison().contains(created.id));
}

#[tokio::test]
async fn test_invalid_input_is_rejected_without_invalidation() {
    let f = fixture(two_plants()).await;
    f.catalog.records().await.unwrap();
    assert!(f.catalog.create_record(&PlantInput::default()).await.is_err());
    assert!(f.catalog.cache().is_fresh());
}

#[tokio::test]
async fn test_compare_toggle_and_image_removal() {
    let f = fixture(two_plants()).await;
    assert_eq!(f.catalog.compare_toggle(1).await.unwrap(), SelectionChange::Added);
    assert_eq!(f.catalog.compare_toggle(1).await.unwrap(), SelectionChange::Removed);

    f.catalog.add_image(2, "https://img/a.jpg").await.unwrap();
    let images = f.catalog.remove_image(2, "https://img/a.jpg").await.unwrap();
    assert!(images.is_empty());
}

struct FixedSeries;

impl SupplementalSeries for FixedSeries {
    fn monthly_discoveries(&self) -> Vec<MonthlyCount> {
        vec![MonthlyCount {
            month: "Jan".into(),
            count: 7,
        }]
    }
    fn plant_traits(&self) -> Vec<TraitValue> {
        Vec::new()
    }
    fn environmental_data(&self) -> Vec<EnvironmentReading> {
        Vec::new()
    }
}

#[tokio::test]
async fn test_custom_supplemental_series() {
    let f = fixture(two_plants()).await;
    let catalog = f.catalog.with_series(Arc::new(FixedSeries));
    let stats = catalog.statistics().await.unwrap();
    assert_eq!(stats.monthly_discoveries.len(), 1);
    assert_eq!(stats.monthly_discoveries[0].count, 7);
    assert!(stats.plant_traits.is_empty());
}
