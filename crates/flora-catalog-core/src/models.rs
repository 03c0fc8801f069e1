//! Core data models for Flora Catalog.
//!
//! These types describe the plant records that flow from the record source,
//! through the cache, into the filter/sort pipeline and the aggregation
//! engine. Field names follow the REST backend's JSON shape so records can be
//! deserialized directly from API responses and from the persisted cache
//! envelope.
//!
//! Habits and conservation statuses are *open* enumerations: a closed core set
//! plus a catch-all variant carrying the raw value. Values the backend adds at
//! runtime therefore never fail deserialization, and every `match` over them
//! stays exhaustive.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Rarity assumed for records without a score: the midpoint of `0..=100`.
pub const DEFAULT_RARITY: f64 = 50.0;

/// A category a plant belongs to (many-to-many).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A survey location from the location catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
}

/// Growth habit of a plant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Habit {
    Tree,
    Shrub,
    Herb,
    Climber,
    /// A habit observed in the data but not part of the core set.
    Other(String),
}

impl Habit {
    pub fn as_str(&self) -> &str {
        match self {
            Habit::Tree => "Tree",
            Habit::Shrub => "Shrub",
            Habit::Herb => "Herb",
            Habit::Climber => "Climber",
            Habit::Other(raw) => raw,
        }
    }
}

impl From<String> for Habit {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Tree" => Habit::Tree,
            "Shrub" => Habit::Shrub,
            "Herb" => Habit::Herb,
            "Climber" => Habit::Climber,
            _ => Habit::Other(raw),
        }
    }
}

impl From<Habit> for String {
    fn from(habit: Habit) -> Self {
        match habit {
            Habit::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Habit {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Habit::from(s.trim().to_string()))
    }
}

impl fmt::Display for Habit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IUCN Red List conservation status.
///
/// The seven assessed codes are ordered by a severity rank (see
/// [`severity_rank`](RedListStatus::severity_rank)). `DD`, `NE` and `NIL` are
/// data-quality codes that carry no rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RedListStatus {
    Extinct,
    ExtinctInTheWild,
    CriticallyEndangered,
    Endangered,
    Vulnerable,
    NearThreatened,
    LeastConcern,
    DataDeficient,
    NotEvaluated,
    Nil,
    Unrecognized(String),
}

impl RedListStatus {
    /// Short code as stored by the backend (`"CR"`, `"LC"`, ...).
    pub fn code(&self) -> &str {
        match self {
            RedListStatus::Extinct => "EX",
            RedListStatus::ExtinctInTheWild => "EW",
            RedListStatus::CriticallyEndangered => "CR",
            RedListStatus::Endangered => "EN",
            RedListStatus::Vulnerable => "VU",
            RedListStatus::NearThreatened => "NT",
            RedListStatus::LeastConcern => "LC",
            RedListStatus::DataDeficient => "DD",
            RedListStatus::NotEvaluated => "NE",
            RedListStatus::Nil => "NIL",
            RedListStatus::Unrecognized(raw) => raw,
        }
    }

    /// Severity rank used by the `conservation_status` sort.
    ///
    /// `LC` = 0 up to `EX` = 6. Everything without an assessment rank,
    /// including unrecognized codes, is `-1`.
    pub fn severity_rank(&self) -> i32 {
        match self {
            RedListStatus::LeastConcern => 0,
            RedListStatus::NearThreatened => 1,
            RedListStatus::Vulnerable => 2,
            RedListStatus::Endangered => 3,
            RedListStatus::CriticallyEndangered => 4,
            RedListStatus::ExtinctInTheWild => 5,
            RedListStatus::Extinct => 6,
            RedListStatus::DataDeficient
            | RedListStatus::NotEvaluated
            | RedListStatus::Nil
            | RedListStatus::Unrecognized(_) => -1,
        }
    }

    /// True for `EN` and `CR`, the statuses counted as "endangered" in the
    /// dashboard summary.
    pub fn is_endangered(&self) -> bool {
        matches!(
            self,
            RedListStatus::Endangered | RedListStatus::CriticallyEndangered
        )
    }
}

impl From<String> for RedListStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "EX" => RedListStatus::Extinct,
            "EW" => RedListStatus::ExtinctInTheWild,
            "CR" => RedListStatus::CriticallyEndangered,
            "EN" => RedListStatus::Endangered,
            "VU" => RedListStatus::Vulnerable,
            "NT" => RedListStatus::NearThreatened,
            "LC" => RedListStatus::LeastConcern,
            "DD" => RedListStatus::DataDeficient,
            "NE" => RedListStatus::NotEvaluated,
            "NIL" => RedListStatus::Nil,
            _ => RedListStatus::Unrecognized(raw),
        }
    }
}

impl From<RedListStatus> for String {
    fn from(status: RedListStatus) -> Self {
        match status {
            RedListStatus::Unrecognized(raw) => raw,
            known => known.code().to_string(),
        }
    }
}

impl FromStr for RedListStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RedListStatus::from(s.trim().to_string()))
    }
}

impl fmt::Display for RedListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One plant specimen entry, as returned by the record source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: i64,
    pub scientific_name: String,
    #[serde(default, alias = "tamil_name")]
    pub vernacular_name: Option<String>,
    #[serde(default)]
    pub herbarium_id: Option<String>,

    #[serde(default)]
    pub taxonomic_class: Option<String>,
    #[serde(default)]
    pub taxonomic_subclass: Option<String>,
    #[serde(default)]
    pub taxonomic_order: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub subfamily: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub series: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub habit: Option<Habit>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub red_list_category: Option<RedListStatus>,

    #[serde(default)]
    pub categories_list: Vec<Category>,
    #[serde(default)]
    pub location: Option<i64>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub rarity_score: Option<f64>,

    #[serde(default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub collection_date: Option<String>,

    #[serde(default)]
    pub collector: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uses: Option<String>,
    #[serde(default)]
    pub flowering_period: Option<String>,
    #[serde(default)]
    pub fruiting_period: Option<String>,
    #[serde(default)]
    pub life_cycle: Option<String>,
    #[serde(default)]
    pub ethnobotanical_notes: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl PlantRecord {
    /// Minimal record with only the required fields set.
    pub fn new(id: i64, scientific_name: impl Into<String>) -> Self {
        Self {
            id,
            scientific_name: scientific_name.into(),
            vernacular_name: None,
            herbarium_id: None,
            taxonomic_class: None,
            taxonomic_subclass: None,
            taxonomic_order: None,
            family: None,
            subfamily: None,
            genus: None,
            species: None,
            series: None,
            habit: None,
            red_list_category: None,
            categories_list: Vec::new(),
            location: None,
            location_name: None,
            images: Vec::new(),
            rarity_score: None,
            date_added: None,
            last_updated: None,
            collection_date: None,
            collector: None,
            identifier: None,
            description: None,
            uses: None,
            flowering_period: None,
            fruiting_period: None,
            life_cycle: None,
            ethnobotanical_notes: None,
            remarks: None,
        }
    }

    /// Rarity score, falling back to [`DEFAULT_RARITY`] when unset.
    pub fn effective_rarity(&self) -> f64 {
        self.rarity_score.unwrap_or(DEFAULT_RARITY)
    }

    /// `date_added` as Unix milliseconds; missing or unparseable dates are `0`.
    pub fn date_added_millis(&self) -> i64 {
        self.date_added
            .as_deref()
            .and_then(parse_timestamp_millis)
            .unwrap_or(0)
    }
}

/// Writable fields sent to the record source on create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantInput {
    pub scientific_name: String,
    #[serde(default, rename = "tamil_name", skip_serializing_if = "Option::is_none")]
    pub vernacular_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub herbarium_id: Option<String>,
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomic_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomic_subclass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomic_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit: Option<Habit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_list_category: Option<RedListStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowering_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fruiting_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_cycle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnobotanical_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl PlantInput {
    /// Reject inputs without a scientific name.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scientific_name.trim().is_empty() {
            anyhow::bail!("scientific_name must not be empty");
        }
        Ok(())
    }
}

/// Parse a backend timestamp into Unix milliseconds.
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00Z`, with or without fractional
/// seconds), naive date-times (interpreted as UTC) and plain dates.
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Deserialize an optional tag, treating `""` the same as `null`.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(T::from))
}
