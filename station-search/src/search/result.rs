//! Search result types.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::domain::Station;
use crate::matcher::{FuzzyMatch, MatchKind};

/// How a query matched a station name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    Exact,
    Prefix,
    Substring,
    Fuzzy,
    /// Matched through individual words rather than the whole name.
    Token,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Prefix => "prefix",
            MatchType::Substring => "substring",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Token => "token",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MatchKind> for MatchType {
    fn from(kind: MatchKind) -> Self {
        match kind {
            MatchKind::Exact => MatchType::Exact,
            MatchKind::Prefix => MatchType::Prefix,
            MatchKind::Substring => MatchType::Substring,
            MatchKind::Fuzzy | MatchKind::Transposition => MatchType::Fuzzy,
        }
    }
}

/// A station returned by a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub station: Arc<Station>,
    pub score: f64,
    pub match_type: MatchType,
    /// Character ranges of the query within the normalized name.
    ///
    /// `None` unless highlighting was requested.
    pub highlights: Option<Vec<Range<usize>>>,
}

impl SearchResult {
    pub fn new(station: Arc<Station>, score: f64, match_type: MatchType) -> Self {
        Self {
            station,
            score,
            match_type,
            highlights: None,
        }
    }
}

impl From<FuzzyMatch> for SearchResult {
    /// Results with no whole-name match were found through their words.
    fn from(m: FuzzyMatch) -> Self {
        let match_type = m.name_match().map_or(MatchType::Token, MatchType::from);
        SearchResult::new(m.station, m.score, match_type)
    }
}

/// Sort best first, breaking ties by name then id so output is stable.
pub(crate) fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.station.name.cmp(&b.station.name))
            .then_with(|| a.station.id.cmp(&b.station.id))
    });
}
