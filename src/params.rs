//! Filter parameters shared by the CLI flags and the HTTP query string.
//!
//! Multi-valued dimensions are comma-separated (`--habits Tree,Shrub`,
//! `?habits=Tree,Shrub`), which works the same for clap and for URL query
//! decoding.

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use flora_catalog_core::models::{Habit, RedListStatus};
use flora_catalog_core::query::{FilterSpec, RarityRange, SortKey, ViewMode};

#[derive(Debug, Clone, Default, Args, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Case-insensitive substring of the scientific or vernacular name.
    #[arg(long)]
    pub search: Option<String>,

    /// Comma-separated category IDs (any match).
    #[arg(long)]
    pub categories: Option<String>,

    /// Comma-separated habits, e.g. `Tree,Shrub`.
    #[arg(long)]
    pub habits: Option<String>,

    /// Comma-separated Red List codes, e.g. `EN,CR`.
    #[arg(long)]
    pub statuses: Option<String>,

    /// Location ID (exact match).
    #[arg(long)]
    pub location: Option<i64>,

    /// Only favorited plants.
    #[arg(long)]
    pub favorites_only: bool,

    /// Lower rarity bound (default 0).
    #[arg(long)]
    pub rarity_min: Option<f64>,

    /// Upper rarity bound (default 100).
    #[arg(long)]
    pub rarity_max: Option<f64>,

    /// `scientific_name`, `scientific_name_desc`, `conservation_status` or
    /// `recently_added`.
    #[arg(long)]
    pub sort: Option<String>,

    /// `grid`, `list` or `map`.
    #[arg(long)]
    pub view: Option<String>,
}

impl FilterParams {
    pub fn to_spec(&self) -> Result<FilterSpec> {
        let mut spec = FilterSpec::default()
            .with_favorites_only(self.favorites_only)
            .with_location(self.location);

        if let Some(search) = &self.search {
            spec = spec.with_search(search.as_str());
        }
        if let Some(raw) = &self.categories {
            let ids = split_list(raw)
                .map(|s| {
                    s.parse::<i64>()
                        .with_context(|| format!("invalid category id '{}'", s))
                })
                .collect::<Result<Vec<_>>>()?;
            spec = spec.with_categories(ids);
        }
        if let Some(raw) = &self.habits {
            spec = spec.with_habits(split_list(raw).map(|s| Habit::from(s.to_string())));
        }
        if let Some(raw) = &self.statuses {
            spec =
                spec.with_statuses(split_list(raw).map(|s| RedListStatus::from(s.to_string())));
        }
        if self.rarity_min.is_some() || self.rarity_max.is_some() {
            let low = self.rarity_min.unwrap_or(RarityRange::FULL.low);
            let high = self.rarity_max.unwrap_or(RarityRange::FULL.high);
            if low > high {
                anyhow::bail!("rarity_min ({}) must not exceed rarity_max ({})", low, high);
            }
            spec = spec.with_rarity(RarityRange::new(low, high));
        }
        if let Some(sort) = &self.sort {
            spec = spec.with_sort(SortKey::from(sort.trim().to_string()));
        }
        if let Some(view) = &self.view {
            spec = spec.with_view(view.parse::<ViewMode>()?);
        }
        Ok(spec)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}
