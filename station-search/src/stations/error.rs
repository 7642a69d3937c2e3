//! Catalog error types.

/// Errors that can occur when loading a station catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read or written
    #[error("failed to access catalog {path}: {message}")]
    Io { path: String, message: String },

    /// The catalog is not valid JSON or has the wrong shape
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The catalog parsed but lists no stations
    #[error("catalog contains no stations")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CatalogError::Io {
            path: "data/stations.json".to_string(),
            message: "not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to access catalog data/stations.json: not found"
        );
        assert_eq!(CatalogError::Empty.to_string(), "catalog contains no stations");
    }
}
