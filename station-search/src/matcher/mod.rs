//! Typo-tolerant string matching.

mod distance;
mod fuzzy;

pub use distance::{is_transposition, levenshtein, similarity};
pub use fuzzy::{
    FuzzyConfig, FuzzyMatch, FuzzyMatcher, FuzzyStats, MatchInfo, MatchKind, MatchTarget,
    base_relevance,
};
