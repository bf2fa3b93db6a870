//! Data-file loading for the Ratio catalog.
//!
//! Goods, recipes, entities, modules, quality tiers and solver settings are
//! read from RON, TOML or JSON files and assembled into a
//! [`ratio_core::catalog::Catalog`].

pub mod catalog_config;
pub mod loader;
pub mod schema;

pub use catalog_config::{GameData, load_catalog};
pub use loader::DataLoadError;
