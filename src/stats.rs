//! Collection statistics.
//!
//! `flora stats` prints the headline counters and the record-derived chart
//! groups. With `--json` it prints the summary and every aggregate group,
//! including the supplemental series.

use anyhow::Result;
use serde::Serialize;

use flora_catalog_core::stats::{AggregateStatistics, CatalogSummary};

use crate::catalog::Catalog;

#[derive(Serialize)]
struct StatsReport {
    summary: CatalogSummary,
    statistics: AggregateStatistics,
}

pub async fn run_stats(catalog: &Catalog, json: bool) -> Result<()> {
    let summary = catalog.summary().await?;
    let statistics = catalog.statistics().await?;

    if json {
        let report = StatsReport {
            summary,
            statistics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Flora Catalog: Collection Stats");
    println!("===============================");
    println!();
    println!("  Plants:      {}", summary.total_plants);
    println!("  Endangered:  {} (EN or CR)", summary.endangered_count);
    println!("  Categories:  {}", summary.categories_count);
    println!("  Favorites:   {}", summary.favorites_count);

    if !statistics.habit_stats.is_empty() {
        println!();
        println!("  By habit:");
        for stat in &statistics.habit_stats {
            println!("    {:<20} {:>6}", stat.name, stat.value);
        }
    }

    if !statistics.conservation_stats.is_empty() {
        println!();
        println!("  By conservation status:");
        for stat in &statistics.conservation_stats {
            println!("    {:<20} {:>6}", stat.status, stat.count);
        }
    }

    if !statistics.category_stats.is_empty() {
        println!();
        println!("  Top categories:");
        for stat in statistics.category_stats.iter().take(10) {
            println!("    {:<20} {:>6}", stat.name, stat.count);
        }
    }

    if !statistics.geographic_distribution.is_empty() {
        println!();
        println!("  By location:");
        for stat in &statistics.geographic_distribution {
            println!("    {:<20} {:>6}", stat.region, stat.count);
        }
    }

    Ok(())
}
