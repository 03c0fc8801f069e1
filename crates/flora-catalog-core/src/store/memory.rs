//! In-memory [`RecordSource`] and [`KeyValueStore`] implementations for
//! testing and WASM targets.
//!
//! State lives behind `std::sync::RwLock`. The record source counts full
//! fetches and can be switched to a failing mode, which is what cache tests
//! need to observe single-flight and failure behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{Category, Location, PlantInput, PlantRecord};

use super::{KeyValueStore, RecordSource};

/// In-memory record source.
pub struct InMemoryRecordSource {
    records: RwLock<Vec<PlantRecord>>,
    categories: RwLock<Vec<Category>>,
    locations: RwLock<Vec<Location>>,
    fetch_count: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryRecordSource {
    pub fn new(records: Vec<PlantRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            categories: RwLock::new(Vec::new()),
            locations: RwLock::new(Vec::new()),
            fetch_count: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn with_catalog(self, categories: Vec<Category>, locations: Vec<Location>) -> Self {
        *self
            .categories
            .write()
            .unwrap_or_else(PoisonError::into_inner) = categories;
        *self
            .locations
            .write()
            .unwrap_or_else(PoisonError::into_inner) = locations;
        self
    }

    /// Number of completed or attempted `fetch_all_records` calls.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// While unavailable, every operation fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Replace the backing collection, as if edited by another client.
    pub fn replace_records(&self, records: Vec<PlantRecord>) {
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = records;
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("record source unavailable");
        }
        Ok(())
    }

    fn apply_input(record: &mut PlantRecord, input: &PlantInput, categories: &[Category]) {
        record.scientific_name = input.scientific_name.clone();
        record.vernacular_name = input.vernacular_name.clone();
        record.herbarium_id = input.herbarium_id.clone();
        record.taxonomic_class = input.taxonomic_class.clone();
        record.taxonomic_subclass = input.taxonomic_subclass.clone();
        record.taxonomic_order = input.taxonomic_order.clone();
        record.family = input.family.clone();
        record.genus = input.genus.clone();
        record.species = input.species.clone();
        record.collector = input.collector.clone();
        record.identifier = input.identifier.clone();
        record.collection_date = input.collection_date.clone();
        record.location = input.location;
        record.habit = input.habit.clone();
        record.description = input.description.clone();
        record.red_list_category = input.red_list_category.clone();
        record.uses = input.uses.clone();
        record.flowering_period = input.flowering_period.clone();
        record.fruiting_period = input.fruiting_period.clone();
        record.life_cycle = input.life_cycle.clone();
        record.ethnobotanical_notes = input.ethnobotanical_notes.clone();
        record.remarks = input.remarks.clone();
        record.categories_list = categories
            .iter()
            .filter(|c| input.categories.contains(&c.id))
            .cloned()
            .collect();
    }
}

impl Default for InMemoryRecordSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch_all_records(&self) -> Result<Vec<PlantRecord>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.check_available()?;
        Ok(self
            .categories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn fetch_locations(&self) -> Result<Vec<Location>> {
        self.check_available()?;
        Ok(self
            .locations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn get_record(&self, id: i64) -> Result<Option<PlantRecord>> {
        self.check_available()?;
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn create_record(&self, input: &PlantInput) -> Result<PlantRecord> {
        self.check_available()?;
        input.validate()?;
        let categories = self
            .categories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut record = PlantRecord::new(id, input.scientific_name.clone());
        Self::apply_input(&mut record, input, &categories);
        record.date_added = Some(chrono::Utc::now().to_rfc3339());
        records.push(record.clone());
        Ok(record)
    }

    async fn update_record(&self, id: i64, input: &PlantInput) -> Result<PlantRecord> {
        self.check_available()?;
        input.validate()?;
        let categories = self
            .categories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            bail!("plant {} not found", id);
        };
        Self::apply_input(record, input, &categories);
        record.last_updated = Some(chrono::Utc::now().to_rfc3339());
        Ok(record.clone())
    }

    async fn delete_record(&self, id: i64) -> Result<()> {
        self.check_available()?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            bail!("plant {} not found", id);
        }
        Ok(())
    }

    async fn add_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        self.check_available()?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            bail!("plant {} not found", id);
        };
        if !record.images.iter().any(|u| u == url) {
            record.images.push(url.to_string());
        }
        Ok(record.images.clone())
    }

    async fn remove_image(&self, id: i64, url: &str) -> Result<Vec<String>> {
        self.check_available()?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            bail!("plant {} not found", id);
        };
        record.images.retain(|u| u != url);
        Ok(record.images.clone())
    }
}

/// In-memory key/value store.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
