//! Domain types for station search.
//!
//! Identifiers are validated at construction time, so code that receives a
//! [`StationId`] can trust it is non-empty and unpadded.

mod station;

pub use station::{InvalidStationId, Station, StationId};
