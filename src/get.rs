//! Plant retrieval by ID.
//!
//! Used by the `flora get` CLI command.

use anyhow::Result;

use flora_catalog_core::models::PlantRecord;

use crate::catalog::Catalog;

pub async fn run_get(catalog: &Catalog, id: i64, json: bool) -> Result<()> {
    let record = match catalog.get(id).await? {
        Some(record) => record,
        None => {
            eprintln!("Error: plant not found: {}", id);
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    print_record(&record, catalog.is_favorite(id));
    Ok(())
}

fn print_record(record: &PlantRecord, favorite: bool) {
    println!("--- Plant ---");
    println!("id:              {}", record.id);
    println!("scientific_name: {}", record.scientific_name);
    let optional = [
        ("vernacular_name", record.vernacular_name.as_deref()),
        ("herbarium_id", record.herbarium_id.as_deref()),
        ("family", record.family.as_deref()),
        ("genus", record.genus.as_deref()),
        ("species", record.species.as_deref()),
        ("location", record.location_name.as_deref()),
        ("collector", record.collector.as_deref()),
        ("collected", record.collection_date.as_deref()),
        ("date_added", record.date_added.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("{:<16} {}", format!("{}:", label), value);
        }
    }
    if let Some(habit) = &record.habit {
        println!("habit:           {}", habit);
    }
    if let Some(status) = &record.red_list_category {
        println!("red_list:        {}", status);
    }
    println!("rarity:          {}", record.effective_rarity());
    if !record.categories_list.is_empty() {
        let names: Vec<&str> = record
            .categories_list
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        println!("categories:      {}", names.join(", "));
    }
    println!("favorite:        {}", if favorite { "yes" } else { "no" });

    if let Some(description) = &record.description {
        println!();
        println!("--- Description ---");
        println!("{}", description);
    }
    if !record.images.is_empty() {
        println!();
        println!("--- Images ({}) ---", record.images.len());
        for url in &record.images {
            println!("{}", url);
        }
    }
}
