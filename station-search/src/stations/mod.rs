//! Station catalog loading.
//!
//! The search engine is built once from a catalog snapshot. Providers hand
//! over the full list of stations and are never consulted again.

mod catalog;
mod error;

pub use catalog::{CatalogProvider, JsonCatalog};
pub use error::CatalogError;
