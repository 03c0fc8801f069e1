//! `flora list`: print the filtered, sorted view.

use anyhow::Result;

use flora_catalog_core::models::PlantRecord;
use flora_catalog_core::query::FilterSpec;

use crate::catalog::Catalog;

pub async fn run_list(catalog: &Catalog, spec: &FilterSpec, json: bool) -> Result<()> {
    let view = catalog.view(spec).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("No plants match.");
        return Ok(());
    }

    let favorites = catalog.favorites();
    println!(
        "{:<6} {:<36} {:<24} {:<10} {:<6} FAV",
        "ID", "SCIENTIFIC NAME", "VERNACULAR", "HABIT", "STATUS"
    );
    for record in &view {
        println!("{}", format_row(record, favorites.contains(record.id)));
    }
    println!();
    println!("{} plant(s), sorted by {}", view.len(), spec.sort);
    Ok(())
}

fn format_row(record: &PlantRecord, favorite: bool) -> String {
    format!(
        "{:<6} {:<36} {:<24} {:<10} {:<6} {}",
        record.id,
        truncate(&record.scientific_name, 36),
        truncate(record.vernacular_name.as_deref().unwrap_or("-"), 24),
        record.habit.as_ref().map_or("-".to_string(), |h| h.to_string()),
        record
            .red_list_category
            .as_ref()
            .map_or("-".to_string(), |s| s.to_string()),
        if favorite { "*" } else { "" }
    )
}

/// Cut to at most `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
