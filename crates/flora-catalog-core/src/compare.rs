//! Side-by-side comparison selection.
//!
//! At most [`MAX_COMPARE`] plants can be selected. Adding beyond the limit is
//! a non-fatal rejection: the selection is left untouched and the caller is
//! told via [`SelectionChange::LimitReached`].

use serde::Serialize;

use crate::models::PlantRecord;

/// Maximum number of plants in one comparison.
pub const MAX_COMPARE: usize = 4;

/// Outcome of a selection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionChange {
    Added,
    AlreadySelected,
    Removed,
    NotSelected,
    /// The selection is full; nothing changed.
    LimitReached,
    /// The ID is not in the collection; nothing changed.
    UnknownPlant,
}

/// Bounded set of plant IDs, kept in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSelection {
    ids: Vec<i64>,
}

impl ComparisonSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: i64) -> SelectionChange {
        if self.contains(id) {
            return SelectionChange::AlreadySelected;
        }
        if self.ids.len() >= MAX_COMPARE {
            return SelectionChange::LimitReached;
        }
        self.ids.push(id);
        SelectionChange::Added
    }

    /// [`add`](Self::add) restricted to plants present in `records`, so
    /// stale or invented IDs never take a slot.
    pub fn add_from(&mut self, id: i64, records: &[PlantRecord]) -> SelectionChange {
        if !records.iter().any(|r| r.id == id) {
            return SelectionChange::UnknownPlant;
        }
        self.add(id)
    }

    pub fn remove(&mut self, id: i64) -> SelectionChange {
        let before = self.ids.len();
        self.ids.retain(|&x| x != id);
        if self.ids.len() < before {
            SelectionChange::Removed
        } else {
            SelectionChange::NotSelected
        }
    }

    pub fn toggle(&mut self, id: i64) -> SelectionChange {
        if self.contains(id) {
            self.remove(id)
        } else {
            self.add(id)
        }
    }

    /// Empty the selection, e.g. when leaving compare mode.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Selected records, looked up in the full collection (not the filtered
    /// view) and returned in collection order. IDs no longer present are
    /// skipped.
    pub fn resolve<'a>(&self, records: &'a [PlantRecord]) -> Vec<&'a PlantRecord> {
        records.iter().filter(|r| self.contains(r.id)).collect()
    }

    /// Build the property-by-plant comparison table.
    pub fn comparison_table(&self, records: &[PlantRecord]) -> ComparisonTable {
        ComparisonTable::build(&self.resolve(records))
    }
}

/// One property across all compared plants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub property: String,
    pub values: Vec<String>,
}

/// Comparison table: one column per plant, one row per property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonTable {
    /// Plant IDs, in column order.
    pub plant_ids: Vec<i64>,
    pub rows: Vec<ComparisonRow>,
}

const MISSING: &str = "-";

impl ComparisonTable {
    pub fn build(plants: &[&PlantRecord]) -> Self {
        let row = |property: &str, value: &dyn Fn(&PlantRecord) -> Option<String>| ComparisonRow {
            property: property.to_string(),
            values: plants
                .iter()
                .map(|p| value(p).unwrap_or_else(|| MISSING.to_string()))
                .collect(),
        };

        let rows = vec![
            row("Image", &|p| p.images.first().cloned()),
            row("Scientific Name", &|p| Some(p.scientific_name.clone())),
            row("Vernacular Name", &|p| p.vernacular_name.clone()),
            row("Habit", &|p| p.habit.as_ref().map(|h| h.to_string())),
            row("Conservation Status", &|p| {
                p.red_list_category.as_ref().map(|s| s.to_string())
            }),
            row("Location", &|p| p.location_name.clone()),
            row("Categories", &|p| {
                if p.categories_list.is_empty() {
                    None
                } else {
                    Some(
                        p.categories_list
                            .iter()
                            .map(|c| c.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    )
                }
            }),
        ];

        Self {
            plant_ids: plants.iter().map(|p| p.id).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Habit};

    #[test]
    fn test_fifth_add_rejected() {
        let mut sel = ComparisonSelection::new();
        for id in 1..=4 {
            assert_eq!(sel.add(id), SelectionChange::Added);
        }
        assert_eq!(sel.add(5), SelectionChange::LimitReached);
        assert_eq!(sel.len(), 4);
        assert!(!sel.contains(5));
        assert_eq!(sel.ids(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_add_from_rejects_ids_outside_collection() {
        let records = vec![PlantRecord::new(1, "A"), PlantRecord::new(2, "B")];
        let mut sel = ComparisonSelection::new();
        for id in 900..904 {
            assert_eq!(sel.add_from(id, &records), SelectionChange::UnknownPlant);
        }
        assert!(sel.is_empty());
        assert_eq!(sel.add_from(1, &records), SelectionChange::Added);
        assert_eq!(sel.comparison_table(&records).plant_ids, vec![1]);
    }

    #[test]
    fn test_readding_when_full_is_not_a_rejection() {
        let mut sel = ComparisonSelection::new();
        for id in 1..=4 {
            sel.add(id);
        }
        assert_eq!(sel.add(2), SelectionChange::AlreadySelected);
    }

    #[test]
    fn test_bound_holds_for_any_sequence() {
        let mut sel = ComparisonSelection::new();
        for id in [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5, 8, 9, 7] {
            sel.toggle(id);
            assert!(sel.len() <= MAX_COMPARE);
            sel.add(id * 10);
            assert!(sel.len() <= MAX_COMPARE);
        }
    }

    #[test]
    fn test_toggle_remove_clear() {
        let mut sel = ComparisonSelection::new();
        assert_eq!(sel.toggle(1), SelectionChange::Added);
        assert_eq!(sel.toggle(1), SelectionChange::Removed);
        assert_eq!(sel.remove(1), SelectionChange::NotSelected);
        sel.add(2);
        sel.add(3);
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn test_resolve_uses_collection_order() {
        let records = vec![
            PlantRecord::new(1, "A"),
            PlantRecord::new(2, "B"),
            PlantRecord::new(3, "C"),
        ];
        let mut sel = ComparisonSelection::new();
        sel.add(3);
        sel.add(1);
        sel.add(42);
        let resolved: Vec<i64> = sel.resolve(&records).iter().map(|r| r.id).collect();
        assert_eq!(resolved, vec![1, 3]);
    }

    #[test]
    fn test_table_rows_and_missing_values() {
        let mut a = PlantRecord::new(1, "Ficus religiosa");
        a.habit = Some(Habit::Tree);
        a.categories_list = vec![
            Category {
                id: 1,
                name: "Sacred".into(),
            },
            Category {
                id: 2,
                name: "Shade".into(),
            },
        ];
        a.images = vec!["https://img/1.jpg".into(), "https://img/2.jpg".into()];
        let b = PlantRecord::new(2, "Acacia nilotica");
        let table = ComparisonTable::build(&[&a, &b]);
        assert_eq!(table.plant_ids, vec![1, 2]);
        assert_eq!(table.rows.len(), 7);
        assert_eq!(table.rows[0].values, vec!["https://img/1.jpg", "-"]);
        assert_eq!(table.rows[3].values, vec!["Tree", "-"]);
        assert_eq!(table.rows[6].values, vec!["Sacred, Shade", "-"]);
    }
}
