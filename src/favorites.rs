//! `flora favorite` and `flora favorites`.

use anyhow::{bail, Result};

use crate::catalog::Catalog;

/// Toggle a plant in the favorite set and report the new state.
pub async fn run_toggle(catalog: &Catalog, id: i64) -> Result<()> {
    let Some(member) = catalog.toggle_favorite(id).await? else {
        bail!("plant not found: {}", id);
    };
    let name = catalog
        .get(id)
        .await?
        .map_or_else(|| id.to_string(), |record| record.scientific_name);
    if member {
        println!("Added {} ({}) to favorites.", name, id);
    } else {
        println!("Removed {} ({}) from favorites.", name, id);
    }
    Ok(())
}

pub async fn run_list(catalog: &Catalog) -> Result<()> {
    let records = catalog.favorite_records().await?;
    if records.is_empty() {
        println!("No favorites yet.");
        return Ok(());
    }
    for record in &records {
        println!("{:<6} {}", record.id, record.scientific_name);
    }
    Ok(())
}
