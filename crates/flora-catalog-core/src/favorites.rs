//! User favorites.
//!
//! A [`FavoriteSet`] is persisted independently of the record cache as an
//! explicit JSON array of plant IDs under [`FAVORITES_KEY`]. It has no expiry.

use std::collections::BTreeSet;

/// Key/value store key holding the favorites array.
pub const FAVORITES_KEY: &str = "favoritePlants";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    ids: BTreeSet<i64>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a stored value. Absent or unreadable data yields an empty set.
    pub fn from_stored(stored: Option<&str>) -> Self {
        let ids = stored
            .and_then(|raw| serde_json::from_str::<Vec<i64>>(raw).ok())
            .unwrap_or_default();
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Serialize the full set as a JSON array of IDs.
    pub fn to_stored(&self) -> String {
        serde_json::to_string(&self.ids).unwrap_or_else(|_| "[]".to_string())
    }

    /// Add `id` if absent, remove it if present. Returns the new membership.
    pub fn toggle(&mut self, id: i64) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
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

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<i64> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
