//! Collaborator abstractions for Flora Catalog.
//!
//! The [`RecordSource`] trait is the remote catalog the cache fetches from;
//! the [`KeyValueStore`] trait is the durable string store that keeps
//! favorites and the cache envelope across runs. Both are pluggable (HTTP or
//! in-memory sources, SQLite or in-memory stores).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Category, Location, PlantInput, PlantRecord};

/// Remote source of plant records and catalog metadata.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_all_records`](RecordSource::fetch_all_records) | Complete collection, all pages |
/// | [`fetch_categories`](RecordSource::fetch_categories) | Category catalog |
/// | [`fetch_locations`](RecordSource::fetch_locations) | Location catalog |
/// | [`get_record`](RecordSource::get_record) | One record by ID |
/// | [`create_record`](RecordSource::create_record) | Create a record |
/// | [`update_record`](RecordSource::update_record) | Replace a record's writable fields |
/// | [`delete_record`](RecordSource::delete_record) | Delete a record |
/// | [`add_image`](RecordSource::add_image) | Attach an image URL |
/// | [`remove_image`](RecordSource::remove_image) | Detach an image URL |
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the complete collection. Errors are transient; no retry is
    /// attempted here.
    async fn fetch_all_records(&self) -> Result<Vec<PlantRecord>>;

    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    async fn fetch_locations(&self) -> Result<Vec<Location>>;

    /// `Ok(None)` when no record has this ID.
    async fn get_record(&self, id: i64) -> Result<Option<PlantRecord>>;

    async fn create_record(&self, input: &PlantInput) -> Result<PlantRecord>;

    async fn update_record(&self, id: i64, input: &PlantInput) -> Result<PlantRecord>;

    async fn delete_record(&self, id: i64) -> Result<()>;

    /// Returns the record's image list after the change.
    async fn add_image(&self, id: i64, url: &str) -> Result<Vec<String>>;

    /// Returns the record's image list after the change.
    async fn remove_image(&self, id: i64, url: &str) -> Result<Vec<String>>;
}

/// Durable string key/value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
