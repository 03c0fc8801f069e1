use anyhow::Result;

use crate::catalog::Catalog;

pub async fn list_categories(catalog: &Catalog) -> Result<()> {
    let categories = catalog.categories().await?;
    println!("{:<6} NAME", "ID");
    for category in categories {
        println!("{:<6} {}", category.id, category.name);
    }
    Ok(())
}

pub async fn list_locations(catalog: &Catalog) -> Result<()> {
    let locations = catalog.locations().await?;
    println!("{:<6} NAME", "ID");
    for location in locations {
        println!("{:<6} {}", location.id, location.name);
    }
    Ok(())
}
