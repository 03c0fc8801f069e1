//! Filter state: the immutable snapshot of all active search, filter,
//! sort and view criteria.
//!
//! A [`FilterSpec`] is never mutated in place. Every change produces a new
//! value through the `with_*` builders, so the filter engine only ever sees a
//! complete, consistent filter.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Habit, RedListStatus};

/// Inclusive rarity bounds. `[0, 100]` is the "no constraint" default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityRange {
    pub low: f64,
    pub high: f64,
}

impl RarityRange {
    pub const FULL: RarityRange = RarityRange {
        low: 0.0,
        high: 100.0,
    };

    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// True only for exactly `[0, 100]`; any narrower bound still filters.
    pub fn is_full(&self) -> bool {
        self.low == Self::FULL.low && self.high == Self::FULL.high
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.low && score <= self.high
    }
}

impl Default for RarityRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// Named comparator for the sort engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    #[default]
    ScientificName,
    ScientificNameDesc,
    ConservationStatus,
    RecentlyAdded,
    /// Any other key: the sort engine leaves the order untouched.
    Unknown(String),
}

impl SortKey {
    pub fn as_str(&self) -> &str {
        match self {
            SortKey::ScientificName => "scientific_name",
            SortKey::ScientificNameDesc => "scientific_name_desc",
            SortKey::ConservationStatus => "conservation_status",
            SortKey::RecentlyAdded => "recently_added",
            SortKey::Unknown(raw) => raw,
        }
    }
}

impl From<String> for SortKey {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "scientific_name" => SortKey::ScientificName,
            "scientific_name_desc" => SortKey::ScientificNameDesc,
            "conservation_status" => SortKey::ConservationStatus,
            "recently_added" => SortKey::RecentlyAdded,
            _ => SortKey::Unknown(raw),
        }
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortKey::from(s.trim().to_string()))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation mode. Carried with the filter but never consulted by
/// the filter or sort engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
    Map,
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            "map" => Ok(ViewMode::Map),
            other => anyhow::bail!("Unknown view mode: '{}'. Use grid, list, or map.", other),
        }
    }
}

/// All active filter, sort and view criteria.
///
/// An empty set on any multi-valued dimension means "no constraint on that
/// dimension", never "admit nothing".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Case-insensitive substring matched against scientific and vernacular names.
    pub search: String,
    /// Admitted category IDs.
    pub categories: BTreeSet<i64>,
    /// Admitted habits.
    pub habits: BTreeSet<Habit>,
    /// Admitted conservation statuses.
    pub statuses: BTreeSet<RedListStatus>,
    /// Exact location match.
    pub location_id: Option<i64>,
    /// Only admit favorited records.
    pub favorites_only: bool,
    pub rarity: RarityRange,
    pub sort: SortKey,
    pub view: ViewMode,
}

impl FilterSpec {
    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self
        }
    }

    pub fn with_categories(self, categories: impl IntoIterator<Item = i64>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            ..self
        }
    }

    pub fn with_habits(self, habits: impl IntoIterator<Item = Habit>) -> Self {
        Self {
            habits: habits.into_iter().collect(),
            ..self
        }
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = RedListStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            ..self
        }
    }

    pub fn with_location(self, location_id: Option<i64>) -> Self {
        Self {
            location_id,
            ..self
        }
    }

    pub fn with_favorites_only(self, favorites_only: bool) -> Self {
        Self {
            favorites_only,
            ..self
        }
    }

    pub fn with_rarity(self, rarity: RarityRange) -> Self {
        Self { rarity, ..self }
    }

    pub fn with_sort(self, sort: SortKey) -> Self {
        Self { sort, ..self }
    }

    pub fn with_view(self, view: ViewMode) -> Self {
        Self { view, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_unconstrained() {
        let spec = FilterSpec::default();
        assert!(spec.search.is_empty());
        assert!(spec.categories.is_empty());
        assert!(spec.rarity.is_full());
        assert_eq!(spec.sort, SortKey::ScientificName);
        assert_eq!(spec.view, ViewMode::Grid);
    }

    #[test]
    fn test_builders_replace_whole_value() {
        let base = FilterSpec::default();
        let narrowed = base.clone().with_habits([Habit::Tree]).with_search("ficus");
        assert!(base.habits.is_empty());
        assert_eq!(narrowed.habits.len(), 1);
        assert_eq!(narrowed.search, "ficus");
    }

    #[test]
    fn test_partial_rarity_is_not_full() {
        assert!(!RarityRange::new(0.0, 99.0).is_full());
        assert!(!RarityRange::new(1.0, 100.0).is_full());
        assert!(RarityRange::new(40.0, 60.0).contains(50.0));
        assert!(RarityRange::new(40.0, 60.0).contains(60.0));
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!(
            "conservation_status".parse::<SortKey>().unwrap(),
            SortKey::ConservationStatus
        );
        assert_eq!(
            "by_color".parse::<SortKey>().unwrap(),
            SortKey::Unknown("by_color".into())
        );
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"habits": ["Tree"], "sort": "recently_added"}"#).unwrap();
        assert!(spec.habits.contains(&Habit::Tree));
        assert_eq!(spec.sort, SortKey::RecentlyAdded);
        assert!(spec.rarity.is_full());
    }
}
