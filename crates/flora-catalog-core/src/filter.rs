//! Filter predicate engine.
//!
//! A record is admitted iff every active dimension of the [`FilterSpec`]
//! passes: logical AND across dimensions, logical OR across the values of a
//! multi-valued dimension. The predicate is pure and is re-evaluated over the
//! full record collection for every filter.
//!
//! | Dimension | Active when | Passes when |
//! |-----------|-------------|-------------|
//! | search | non-empty | substring of scientific or vernacular name (case-insensitive) |
//! | categories | non-empty set | any record category ID is in the set |
//! | habits | non-empty set | record habit is in the set |
//! | statuses | non-empty set | record status is in the set |
//! | location | `Some(id)` | record location equals `id` |
//! | favorites | `favorites_only` | record ID is favorited |
//! | rarity | range ≠ `[0, 100]` | effective rarity (default 50) within range |

use crate::favorites::FavoriteSet;
use crate::models::PlantRecord;
use crate::query::FilterSpec;

/// Evaluate the filter against one record.
pub fn admits(record: &PlantRecord, spec: &FilterSpec, favorites: &FavoriteSet) -> bool {
    matches_search(record, &spec.search)
        && matches_categories(record, spec)
        && matches_habit(record, spec)
        && matches_status(record, spec)
        && spec.location_id.map_or(true, |loc| record.location == Some(loc))
        && (!spec.favorites_only || favorites.contains(record.id))
        && (spec.rarity.is_full() || spec.rarity.contains(record.effective_rarity()))
}

/// Narrow `records` to those the filter admits, preserving input order.
pub fn filter_records<'a>(
    records: &'a [PlantRecord],
    spec: &FilterSpec,
    favorites: &FavoriteSet,
) -> Vec<&'a PlantRecord> {
    records
        .iter()
        .filter(|r| admits(r, spec, favorites))
        .collect()
}

fn matches_search(record: &PlantRecord, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    record.scientific_name.to_lowercase().contains(&needle)
        || record
            .vernacular_name
            .as_deref()
            .is_some_and(|v| v.to_lowercase().contains(&needle))
}

fn matches_categories(record: &PlantRecord, spec: &FilterSpec) -> bool {
    spec.categories.is_empty()
        || record
            .categories_list
            .iter()
            .any(|c| spec.categories.contains(&c.id))
}

fn matches_habit(record: &PlantRecord, spec: &FilterSpec) -> bool {
    spec.habits.is_empty()
        || record
            .habit
            .as_ref()
            .is_some_and(|h| spec.habits.contains(h))
}

fn matches_status(record: &PlantRecord, spec: &FilterSpec) -> bool {
    spec.statuses.is_empty()
        || record
            .red_list_category
            .as_ref()
            .is_some_and(|s| spec.statuses.contains(s))
}
