//! # Flora Catalog
//!
//! A local-first browser for a herbarium plant catalog.
//!
//! Flora Catalog fetches the full plant collection from a REST backend, keeps
//! it in a time-bounded cache (persisted to SQLite between runs), and answers
//! every filter, sort, statistics and comparison request from that in-memory
//! snapshot. Results are available from a CLI and a JSON HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ REST backend│──▶│ Record cache │──▶│ Filter ▶ Sort    │──▶ view list
//! │  (reqwest)  │   │ TTL + single │   │ Aggregate        │──▶ chart groups
//! └─────────────┘   │    flight    │   │ Compare (max 4)  │──▶ comparison
//!                   └──────┬───────┘   └──────────────────┘
//!                          │ envelope + favorites
//!                          ▼
//!                     ┌──────────┐        ┌──────────┐  ┌──────────┐
//!                     │  SQLite  │        │   CLI    │  │   HTTP   │
//!                     │ kv_store │        │ (flora)  │  │  (axum)  │
//!                     └──────────┘        └──────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! flora init                          # create the key/value database
//! flora list --habits Tree --sort conservation_status
//! flora stats
//! flora favorite 42
//! flora compare 3 7 42
//! flora serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`cache`] | TTL record cache with single-flight fetch |
//! | [`catalog`] | Session: cache, favorites, comparison, metadata |
//! | [`http_source`] | REST backend record source |
//! | [`sqlite_kv`] | SQLite key/value store |
//! | [`params`] | Filter parameters for CLI and HTTP |
//! | [`server`] | JSON HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//!
//! The pure pipeline (models, filter, sort, aggregation, comparison) lives in
//! the `flora-catalog-core` crate.

pub mod cache;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod db;
pub mod favorites;
pub mod get;
pub mod http_source;
pub mod list;
pub mod migrate;
pub mod params;
pub mod server;
pub mod sources;
pub mod sqlite_kv;
pub mod stats;
