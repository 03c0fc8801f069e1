//! Sort engine.
//!
//! Orders a record list by one of the named [`SortKey`] comparators and
//! returns a new vector; the caller's slice is never reordered. All sorts are
//! stable, so records that compare equal keep their input order.

use std::borrow::Borrow;
use std::cmp::{Ordering, Reverse};

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::PlantRecord;
use crate::query::SortKey;

/// Return a newly ordered copy of `records` according to `key`.
///
/// Works on owned records and on borrowed views (`&PlantRecord`) alike.
pub fn sort_records<R>(records: &[R], key: &SortKey) -> Vec<R>
where
    R: Borrow<PlantRecord> + Clone,
{
    let mut out = records.to_vec();
    match key {
        SortKey::ScientificName => out.sort_by(|a, b| {
            locale_cmp(&a.borrow().scientific_name, &b.borrow().scientific_name)
        }),
        SortKey::ScientificNameDesc => out.sort_by(|a, b| {
            locale_cmp(&b.borrow().scientific_name, &a.borrow().scientific_name)
        }),
        SortKey::ConservationStatus => out.sort_by_key(|r| Reverse(status_rank(r.borrow()))),
        SortKey::RecentlyAdded => out.sort_by_key(|r| Reverse(r.borrow().date_added_millis())),
        SortKey::Unknown(_) => {}
    }
    out
}

/// Severity rank of a record's status; absent status ranks `-1`.
pub fn status_rank(record: &PlantRecord) -> i32 {
    record
        .red_list_category
        .as_ref()
        .map_or(-1, |s| s.severity_rank())
}

/// Locale-aware string comparison.
///
/// 1. Primary: base letters, ignoring diacritics and case.
/// 2. Tertiary: at the first position differing only by case, lowercase
///    sorts first.
/// 3. Final: code-point order, so distinct strings never compare equal.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| case_order(a, b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn case_order(a: &str, b: &str) -> Ordering {
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca == cb {
            continue;
        }
        match (ca.is_lowercase(), cb.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Habit, RedListStatus};

    fn plant(id: i64, name: &str, status: Option<&str>) -> PlantRecord {
        let mut p = PlantRecord::new(id, name);
        p.habit = Some(Habit::Tree);
        p.red_list_category = status.map(|s| RedListStatus::from(s.to_string()));
        p
    }

    fn names(records: &[PlantRecord]) -> Vec<&str> {
        records.iter().map(|r| r.scientific_name.as_str()).collect()
    }

    #[test]
    fn test_name_ascending() {
        let records = vec![
            plant(1, "Ficus religiosa", Some("LC")),
            plant(2, "Acacia nilotica", Some("CR")),
        ];
        let sorted = sort_records(&records, &SortKey::ScientificName);
        assert_eq!(names(&sorted), vec!["Acacia nilotica", "Ficus religiosa"]);
        assert_eq!(names(&records), vec!["Ficus religiosa", "Acacia nilotica"]);
    }

    #[test]
    fn test_most_threatened_first() {
        let records = vec![
            plant(1, "Ficus religiosa", Some("LC")),
            plant(2, "Acacia nilotica", Some("CR")),
        ];
        let sorted = sort_records(&records, &SortKey::ConservationStatus);
        assert_eq!(names(&sorted), vec!["Acacia nilotica", "Ficus religiosa"]);
    }

    #[test]
    fn test_unranked_statuses_sort_last_and_stay_stable() {
        let records = vec![
            plant(1, "A", None),
            plant(2, "B", Some("XX")),
            plant(3, "C", Some("LC")),
            plant(4, "D", Some("EX")),
            plant(5, "E", Some("NIL")),
        ];
        let sorted = sort_records(&records, &SortKey::ConservationStatus);
        assert_eq!(names(&sorted), vec!["D", "C", "A", "B", "E"]);
    }

    #[test]
    fn test_locale_ignores_case_and_diacritics() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Émile", "Eric"), Ordering::Less);
        assert_eq!(locale_cmp("a", "A"), Ordering::Less);
        assert_ne!(locale_cmp("Ficus", "ficus"), Ordering::Equal);
    }

    #[test]
    fn test_sorting_twice_is_stable() {
        let records = vec![
            plant(1, "Mangifera indica", None),
            plant(2, "azadirachta indica", None),
            plant(3, "Azadirachta indica", None),
            plant(4, "Bambusa vulgaris", None),
        ];
        let once = sort_records(&records, &SortKey::ScientificName);
        let twice = sort_records(&once, &SortKey::ScientificName);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_descending_is_exact_inverse() {
        let records = vec![
            plant(1, "Tamarindus indica", None),
            plant(2, "Cassia fistula", None),
            plant(3, "cassia auriculata", None),
            plant(4, "Ziziphus mauritiana", None),
            plant(5, "Ærva lanata", None),
        ];
        let asc = sort_records(&records, &SortKey::ScientificName);
        let mut desc = sort_records(&records, &SortKey::ScientificNameDesc);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_recently_added_missing_dates_last() {
        let mut old = plant(1, "Old", None);
        old.date_added = Some("2020-01-01T00:00:00Z".into());
        let mut new = plant(2, "New", None);
        new.date_added = Some("2024-06-01".into());
        let mut broken = plant(3, "Broken", None);
        broken.date_added = Some("yesterday".into());
        let missing = plant(4, "Missing", None);
        let records = vec![missing, old, broken, new];
        let sorted = sort_records(&records, &SortKey::RecentlyAdded);
        assert_eq!(names(&sorted), vec!["New", "Old", "Missing", "Broken"]);
    }

    #[test]
    fn test_unknown_key_is_identity() {
        let records = vec![plant(1, "Z", None), plant(2, "A", None)];
        let sorted = sort_records(&records, &SortKey::Unknown("popularity".into()));
        assert_eq!(sorted, records);
    }

    #[test]
    fn test_sorts_borrowed_views() {
        let records = vec![plant(1, "Z", None), plant(2, "A", None)];
        let view: Vec<&PlantRecord> = records.iter().collect();
        let sorted = sort_records(&view, &SortKey::ScientificName);
        assert_eq!(sorted[0].id, 2);
    }
}
