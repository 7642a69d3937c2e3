//! Station identifier and entity types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid station id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// A non-empty station identifier.
///
/// Ids are opaque strings owned by the catalog. This type guarantees that
/// any `StationId` is non-empty and carries no surrounding whitespace.
///
/// # Examples
///
/// ```
/// use station_search::domain::StationId;
///
/// let id = StationId::parse("L1-baquedano").unwrap();
/// assert_eq!(id.as_str(), "L1-baquedano");
///
/// assert!(StationId::parse("").is_err());
/// assert!(StationId::parse("  ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    /// Parse a station id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        if s.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }

        if s.trim() != s {
            return Err(InvalidStationId {
                reason: "must not have leading or trailing whitespace",
            });
        }

        Ok(StationId(s.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationId {
    type Error = InvalidStationId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A station in the static catalog.
///
/// Stations are read-only for the lifetime of a search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// Display name of the primary line (e.g. "Línea 1").
    pub line: String,
    pub line_number: u32,
    /// Line color as given by the catalog, usually a hex string.
    pub line_color: String,
    #[serde(default)]
    pub is_transfer: bool,
    /// Other lines reachable from this station.
    #[serde(default)]
    pub transfer_lines: Vec<u32>,
}

impl Station {
    /// Create a non-transfer station on a single line.
    pub fn new(
        id: StationId,
        name: impl Into<String>,
        line: impl Into<String>,
        line_number: u32,
        line_color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            line: line.into(),
            line_number,
            line_color: line_color.into(),
            is_transfer: false,
            transfer_lines: Vec::new(),
        }
    }

    /// Mark the station as a transfer point to the given lines.
    pub fn with_transfers(mut self, lines: impl IntoIterator<Item = u32>) -> Self {
        self.transfer_lines = lines.into_iter().collect();
        self.is_transfer = true;
        self
    }

    /// Number of distinct lines serving this station, including its own.
    pub fn distinct_line_count(&self) -> usize {
        let mut lines: BTreeSet<u32> = self.transfer_lines.iter().copied().collect();
        lines.insert(self.line_number);
        lines.len()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Roundtrip: parse then as_str returns the original
        #[test]
        fn roundtrip(s in "[A-Za-z0-9][A-Za-z0-9_-]{0,15}") {
            let id = StationId::parse(&s).unwrap();
            prop_assert_eq!(id.as_str(), s.as_str());
        }

        /// Padded strings are always rejected
        #[test]
        fn padded_rejected(s in "[a-z]{1,8}") {
            let padded = format!(" {s}");
            prop_assert!(StationId::parse(&padded).is_err());
        }
    }
}
