//! Prefix index over station names.
//!
//! Built once from the catalog and read-only afterwards.

mod trie;

pub use trie::{Trie, TrieStats};
