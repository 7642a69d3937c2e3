//! Search error types.

use crate::domain::StationId;
use crate::stations::CatalogError;

/// Errors from building a search engine or running a search.
///
/// Empty queries and searches with no matches are not errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// Per-query options are out of range
    #[error("invalid search options: {0}")]
    InvalidOptions(String),

    /// Engine configuration is out of range
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Query exceeds the configured length cap
    #[error("query is {len} characters long, maximum is {max}")]
    QueryTooLong { len: usize, max: usize },

    /// The catalog lists the same id twice
    #[error("duplicate station id in catalog: {0}")]
    DuplicateStation(StationId),

    /// The catalog could not be loaded
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),
}
