//! # Flora Catalog CLI (`flora`)
//!
//! The `flora` binary browses a herbarium catalog from the terminal and
//! serves the same data over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! flora --config ./config/flora.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `flora init` | Create the key/value database |
//! | `flora refresh` | Invalidate the cache and refetch the collection |
//! | `flora list [filters]` | Print the filtered, sorted view |
//! | `flora stats` | Print summary counts and chart groups |
//! | `flora get <id>` | Print one plant |
//! | `flora favorite <id>` | Toggle a favorite |
//! | `flora favorites` | List favorited plants |
//! | `flora compare <id>...` | Compare up to four plants |
//! | `flora categories` | List the category catalog |
//! | `flora locations` | List the location catalog |
//! | `flora serve` | Start the JSON HTTP server |
//!
//! Logs go to stderr; set `RUST_LOG` (default `flora_catalog=info`) to
//! change verbosity.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use flora_catalog::catalog::Catalog;
use flora_catalog::params::FilterParams;
use flora_catalog::{compare, config, favorites, get, list, migrate, server, sources, stats};

/// Flora Catalog: browse, filter and compare a herbarium plant catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "flora",
    about = "Flora Catalog: browse, filter and compare a herbarium plant catalog",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/flora.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the key/value database.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Invalidate the cache and refetch the full collection.
    Refresh,

    /// Print the filtered, sorted plant list.
    List {
        #[command(flatten)]
        filters: FilterParams,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print summary counts and aggregate statistics.
    Stats {
        /// Print JSON, including the supplemental series.
        #[arg(long)]
        json: bool,
    },

    /// Print one plant by ID.
    Get {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Toggle a plant in the favorite set.
    Favorite { id: i64 },

    /// List favorited plants.
    Favorites,

    /// Compare up to four plants side by side.
    Compare {
        #[arg(required = true)]
        ids: Vec<i64>,

        #[arg(long)]
        json: bool,
    },

    /// List the category catalog.
    Categories,

    /// List the location catalog.
    Locations,

    /// Start the JSON HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("flora_catalog=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    if let Commands::Init = cli.command {
        migrate::run_migrations(&cfg).await?;
        println!("Database initialized successfully.");
        return Ok(());
    }

    let catalog = Catalog::from_config(&cfg).await?;

    match cli.command {
        Commands::Init => {}
        Commands::Refresh => {
            let envelope = catalog.refresh().await?;
            println!("Fetched {} plants.", envelope.records.len());
        }
        Commands::List { filters, json } => {
            let spec = filters.to_spec()?;
            list::run_list(&catalog, &spec, json).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&catalog, json).await?;
        }
        Commands::Get { id, json } => {
            get::run_get(&catalog, id, json).await?;
        }
        Commands::Favorite { id } => {
            favorites::run_toggle(&catalog, id).await?;
        }
        Commands::Favorites => {
            favorites::run_list(&catalog).await?;
        }
        Commands::Compare { ids, json } => {
            compare::run_compare(&catalog, &ids, json).await?;
        }
        Commands::Categories => {
            sources::list_categories(&catalog).await?;
        }
        Commands::Locations => {
            sources::list_locations(&catalog).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg, Arc::new(catalog)).await?;
        }
    }

    Ok(())
}
