//! View pipeline: filter, then sort.
//!
//! Also derives the option lists a filter panel offers, from what the
//! collection actually contains.

use std::collections::HashSet;

use serde::Serialize;

use crate::favorites::FavoriteSet;
use crate::filter::filter_records;
use crate::models::{Habit, PlantRecord, RedListStatus};
use crate::query::FilterSpec;
use crate::sort::sort_records;

/// The ordered list a caller displays for `spec`.
pub fn build_view<'a>(
    records: &'a [PlantRecord],
    spec: &FilterSpec,
    favorites: &FavoriteSet,
) -> Vec<&'a PlantRecord> {
    let filtered = filter_records(records, spec, favorites);
    sort_records(&filtered, &spec.sort)
}

/// Distinct habit and status values present in a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub habits: Vec<Habit>,
    pub statuses: Vec<RedListStatus>,
}

/// Collect distinct habits and statuses in first-encountered order.
pub fn discover_options(records: &[PlantRecord]) -> FilterOptions {
    let mut options = FilterOptions::default();
    let mut seen_habits = HashSet::new();
    let mut seen_statuses = HashSet::new();
    for record in records {
        if let Some(habit) = &record.habit {
            if seen_habits.insert(habit) {
                options.habits.push(habit.clone());
            }
        }
        if let Some(status) = &record.red_list_category {
            if seen_statuses.insert(status) {
                options.statuses.push(status.clone());
            }
        }
    }
    options
}
