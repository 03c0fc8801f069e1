//! Aggregation engine for the dashboard charts.
//!
//! [`aggregate`] reduces the full (unfiltered) record collection into seven
//! independent statistic groups. Four of them are derived from the records;
//! the monthly-discovery, plant-trait and environmental series are not
//! derivable from record attributes and come from a [`SupplementalSeries`]
//! provider instead.
//!
//! Every call recomputes all groups from scratch. Record-derived groups are
//! deterministic: two calls over the same records produce identical output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::favorites::FavoriteSet;
use crate::models::{PlantRecord, RedListStatus};

/// Cyclic palette for the habit pie chart, indexed by first-encountered order.
pub const HABIT_PALETTE: [&str; 8] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884D8", "#82ca9d", "#ffc658", "#8dd1e1",
];

/// Color for statuses without a semantic color.
pub const FALLBACK_STATUS_COLOR: &str = "#9E9E9E";

/// Fixed semantic color for a conservation status.
pub fn status_color(status: &RedListStatus) -> &'static str {
    match status {
        RedListStatus::LeastConcern => "#4CAF50",
        RedListStatus::NearThreatened => "#FFC107",
        RedListStatus::Vulnerable => "#FF9800",
        RedListStatus::Endangered => "#FF5722",
        RedListStatus::CriticallyEndangered => "#F44336",
        RedListStatus::ExtinctInTheWild => "#9C27B0",
        RedListStatus::Extinct => "#000000",
        RedListStatus::DataDeficient => "#9E9E9E",
        RedListStatus::NotEvaluated => "#607D8B",
        RedListStatus::Nil | RedListStatus::Unrecognized(_) => FALLBACK_STATUS_COLOR,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStat {
    pub name: String,
    pub value: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationStat {
    pub status: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStat {
    pub region: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitValue {
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    pub month: String,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

/// All chart groups for one record collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatistics {
    pub habit_stats: Vec<HabitStat>,
    pub category_stats: Vec<CategoryStat>,
    pub conservation_stats: Vec<ConservationStat>,
    pub geographic_distribution: Vec<RegionStat>,
    pub monthly_discoveries: Vec<MonthlyCount>,
    pub plant_traits: Vec<TraitValue>,
    pub environmental_data: Vec<EnvironmentReading>,
}

/// Source of the chart series that are not derived from plant records.
pub trait SupplementalSeries: Send + Sync {
    fn monthly_discoveries(&self) -> Vec<MonthlyCount>;
    fn plant_traits(&self) -> Vec<TraitValue>;
    fn environmental_data(&self) -> Vec<EnvironmentReading>;
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A [`SupplementalSeries`] backed by fixed vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSeries {
    pub monthly: Vec<MonthlyCount>,
    pub traits: Vec<TraitValue>,
    pub environment: Vec<EnvironmentReading>,
}

impl StaticSeries {
    /// Neutral placeholder data: zero discoveries per month, every trait at
    /// the 50.0 midpoint, and the survey region's reference climate table.
    pub fn placeholder() -> Self {
        let monthly = MONTHS
            .iter()
            .map(|m| MonthlyCount {
                month: m.to_string(),
                count: 0,
            })
            .collect();

        let traits = ["Height", "Leaf Size", "Growth Rate", "Sunlight", "Water Needs"]
            .iter()
            .map(|t| TraitValue {
                trait_name: t.to_string(),
                value: 50.0,
            })
            .collect();

        // (temperature °C, humidity %, rainfall mm)
        let climate: [(f64, f64, f64); 12] = [
            (22.0, 60.0, 20.0),
            (24.0, 65.0, 25.0),
            (26.0, 70.0, 40.0),
            (28.0, 75.0, 65.0),
            (30.0, 80.0, 80.0),
            (29.0, 85.0, 150.0),
            (28.0, 90.0, 180.0),
            (28.0, 88.0, 160.0),
            (27.0, 82.0, 90.0),
            (26.0, 75.0, 70.0),
            (24.0, 68.0, 45.0),
            (23.0, 62.0, 30.0),
        ];
        let environment = MONTHS
            .iter()
            .zip(climate.iter())
            .map(|(m, (t, h, r))| EnvironmentReading {
                month: m.to_string(),
                temperature: *t,
                humidity: *h,
                rainfall: *r,
            })
            .collect();

        Self {
            monthly,
            traits,
            environment,
        }
    }
}

impl Default for StaticSeries {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl SupplementalSeries for StaticSeries {
    fn monthly_discoveries(&self) -> Vec<MonthlyCount> {
        self.monthly.clone()
    }

    fn plant_traits(&self) -> Vec<TraitValue> {
        self.traits.clone()
    }

    fn environmental_data(&self) -> Vec<EnvironmentReading> {
        self.environment.clone()
    }
}

/// Compute every chart group over the full record collection.
pub fn aggregate<S>(records: &[PlantRecord], series: &S) -> AggregateStatistics
where
    S: SupplementalSeries + ?Sized,
{
    AggregateStatistics {
        habit_stats: habit_distribution(records),
        category_stats: category_distribution(records),
        conservation_stats: conservation_distribution(records),
        geographic_distribution: geographic_distribution(records),
        monthly_discoveries: series.monthly_discoveries(),
        plant_traits: series.plant_traits(),
        environmental_data: series.environmental_data(),
    }
}

/// Count per habit; each group colored by its first-encountered index.
pub fn habit_distribution(records: &[PlantRecord]) -> Vec<HabitStat> {
    count_first_seen(records.iter().filter_map(|r| r.habit.as_ref()))
        .into_iter()
        .enumerate()
        .map(|(i, (habit, value))| HabitStat {
            name: habit.to_string(),
            value,
            color: HABIT_PALETTE[i % HABIT_PALETTE.len()].to_string(),
        })
        .collect()
}

/// Count per category name over the multi-valued relation, largest first.
///
/// Ties keep first-encountered order. No truncation happens here.
pub fn category_distribution(records: &[PlantRecord]) -> Vec<CategoryStat> {
    let names = records
        .iter()
        .flat_map(|r| r.categories_list.iter().map(|c| c.name.as_str()));
    let mut stats: Vec<CategoryStat> = count_first_seen(names)
        .into_iter()
        .map(|(name, count)| CategoryStat {
            name: name.to_string(),
            count,
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Count per conservation status with its semantic color.
pub fn conservation_distribution(records: &[PlantRecord]) -> Vec<ConservationStat> {
    count_first_seen(records.iter().filter_map(|r| r.red_list_category.as_ref()))
        .into_iter()
        .map(|(status, count)| ConservationStat {
            status: status.to_string(),
            count,
            color: status_color(status).to_string(),
        })
        .collect()
}

/// Count per denormalized location name. Locations without plants never
/// appear because groups come from the records, not the location catalog.
pub fn geographic_distribution(records: &[PlantRecord]) -> Vec<RegionStat> {
    let regions = records
        .iter()
        .filter_map(|r| r.location_name.as_deref())
        .filter(|name| !name.is_empty());
    count_first_seen(regions)
        .into_iter()
        .map(|(region, count)| RegionStat {
            region: region.to_string(),
            count,
        })
        .collect()
}

/// Headline counters shown above the charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub total_plants: usize,
    /// Plants assessed `EN` or `CR`.
    pub endangered_count: usize,
    /// Size of the category catalog, not only the categories in use.
    pub categories_count: usize,
    pub favorites_count: usize,
}

pub fn summarize(
    records: &[PlantRecord],
    categories_count: usize,
    favorites: &FavoriteSet,
) -> CatalogSummary {
    CatalogSummary {
        total_plants: records.len(),
        endangered_count: records
            .iter()
            .filter(|r| r.red_list_category.as_ref().is_some_and(|s| s.is_endangered()))
            .count(),
        categories_count,
        favorites_count: favorites.len(),
    }
}

/// Count occurrences, keeping groups in the order they were first seen.
fn count_first_seen<'a, K, I>(items: I) -> Vec<(&'a K, usize)>
where
    K: std::hash::Hash + Eq + ?Sized + 'a,
    I: Iterator<Item = &'a K>,
{
    let mut index: HashMap<&'a K, usize> = HashMap::new();
    let mut groups: Vec<(&'a K, usize)> = Vec::new();
    for item in items {
        match index.get(item) {
            Some(&i) => groups[i].1 += 1,
            None => {
                index.insert(item, groups.len());
                groups.push((item, 1));
            }
        }
    }
    groups
}
