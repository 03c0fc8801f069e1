//! # Flora Catalog Core
//!
//! Shared, WASM-safe logic for Flora Catalog: plant models, the filter/sort
//! view pipeline, aggregate statistics, favorites, comparison selection, the
//! cache envelope format, and the collaborator traits (record source and
//! key/value store).
//!
//! This crate contains no tokio, sqlx, HTTP, filesystem I/O, or other
//! native-only dependencies. Every operation except the collaborator traits
//! is a pure function of its inputs.

pub mod compare;
pub mod envelope;
pub mod favorites;
pub mod filter;
pub mod models;
pub mod query;
pub mod sort;
pub mod stats;
pub mod store;
pub mod view;
