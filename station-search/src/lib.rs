//! Typo-tolerant station search.
//!
//! An in-memory index over a small, fixed catalog of metro stations that
//! answers ranked text searches and prefix completions.

pub mod cache;
pub mod domain;
pub mod index;
pub mod matcher;
pub mod search;
pub mod stations;
pub mod text;
