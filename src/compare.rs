//! `flora compare`: side-by-side table for up to four plants.

use anyhow::{bail, Result};
use tracing::warn;

use flora_catalog_core::compare::{ComparisonTable, SelectionChange, MAX_COMPARE};

use crate::catalog::Catalog;

pub async fn run_compare(catalog: &Catalog, ids: &[i64], json: bool) -> Result<()> {
    if ids.is_empty() {
        bail!("compare needs at least one plant id");
    }
    for &id in ids {
        match catalog.compare_add(id).await? {
            SelectionChange::LimitReached => {
                warn!(plant = id, "comparison limit reached");
                eprintln!(
                    "Warning: at most {} plants can be compared; ignoring {}",
                    MAX_COMPARE, id
                );
            }
            SelectionChange::UnknownPlant => {
                warn!(plant = id, "unknown plant skipped");
                eprintln!("Warning: plant not found: {}", id);
            }
            _ => {}
        }
    }

    let table = catalog.comparison_table().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }
    if table.plant_ids.is_empty() {
        println!("None of the given plants exist.");
        return Ok(());
    }
    print!("{}", render(&table));
    Ok(())
}

/// Plain-text rendering, one column per plant.
pub fn render(table: &ComparisonTable) -> String {
    const WIDTH: usize = 28;
    let mut out = format!("{:<20}", "");
    for id in &table.plant_ids {
        out.push_str(&format!(" {:<width$}", format!("#{}", id), width = WIDTH));
    }
    out.push('\n');
    for row in &table.rows {
        out.push_str(&format!("{:<20}", row.property));
        for value in &row.values {
            let cell: String = value.chars().take(WIDTH).collect();
            out.push_str(&format!(" {:<width$}", cell, width = WIDTH));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_catalog_core::models::PlantRecord;

    #[test]
    fn test_render_has_header_and_rows() {
        let a = PlantRecord::new(1, "Ficus religiosa");
        let b = PlantRecord::new(2, "Acacia nilotica");
        let text = render(&ComparisonTable::build(&[&a, &b]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].contains("#1") && lines[0].contains("#2"));
        assert!(lines[2].starts_with("Scientific Name"));
        assert!(lines[2].contains("Acacia nilotica"));
    }
}
