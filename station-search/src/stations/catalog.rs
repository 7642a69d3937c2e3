//! Catalog providers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Station;

use super::error::CatalogError;

/// Source of the station catalog.
pub trait CatalogProvider {
    /// Load every station.
    fn load(&self) -> Result<Vec<Station>, CatalogError>;
}

/// An in-memory catalog.
impl CatalogProvider for Vec<Station> {
    fn load(&self) -> Result<Vec<Station>, CatalogError> {
        Ok(self.clone())
    }
}

/// On-disk shape of a catalog file.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    stations: Vec<Station>,
}

/// A catalog stored as a JSON document of the form `{ "stations": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write stations to the catalog file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, stations: &[Station]) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file = CatalogFile {
            stations: stations.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| CatalogError::Json {
            message: e.to_string(),
        })?;

        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }

    /// Get the catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, err: std::io::Error) -> CatalogError {
        CatalogError::Io {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl CatalogProvider for JsonCatalog {
    fn load(&self) -> Result<Vec<Station>, CatalogError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let file: CatalogFile =
            serde_json::from_str(&contents).map_err(|e| CatalogError::Json {
                message: e.to_string(),
            })?;

        if file.stations.is_empty() {
            return Err(CatalogError::Empty);
        }

        debug!(
            path = %self.path.display(),
            stations = file.stations.len(),
            "loaded station catalog"
        );
        Ok(file.stations)
    }
}
