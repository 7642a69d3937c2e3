//! Per-search observability record.

use std::fmt;
use std::time::Duration;

/// Which retrieval path produced the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Prefix trie only.
    Trie,
    /// Fuzzy matcher only; the trie found nothing.
    Fuzzy,
    /// Trie results re-scored by the ranking engine.
    Ranking,
    /// Trie results extended by the fuzzy matcher.
    Hybrid,
    /// Served from the result cache.
    Cache,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Trie => "trie",
            Algorithm::Fuzzy => "fuzzy",
            Algorithm::Ranking => "ranking",
            Algorithm::Hybrid => "hybrid",
            Algorithm::Cache => "cache",
        })
    }
}

/// A stage the search pipeline executed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStep {
    EmptyQuery,
    CacheHit,
    CacheMiss,
    TrieLookup,
    FuzzyFallback,
    Ranking,
    Filtering,
    Highlighting,
    CacheStore,
}

impl ProcessingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStep::EmptyQuery => "empty-query",
            ProcessingStep::CacheHit => "cache-hit",
            ProcessingStep::CacheMiss => "cache-miss",
            ProcessingStep::TrieLookup => "trie-lookup",
            ProcessingStep::FuzzyFallback => "fuzzy-fallback",
            ProcessingStep::Ranking => "ranking",
            ProcessingStep::Filtering => "filtering",
            ProcessingStep::Highlighting => "highlighting",
            ProcessingStep::CacheStore => "cache-store",
        }
    }
}

impl fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and path information for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMetrics {
    pub search_time: Duration,
    /// Stations in the catalog.
    pub total_stations: usize,
    pub results_found: usize,
    pub cache_hit: bool,
    pub algorithm: Algorithm,
    pub processing_steps: Vec<ProcessingStep>,
}

impl SearchMetrics {
    pub fn search_time_ms(&self) -> f64 {
        self.search_time.as_secs_f64() * 1000.0
    }

    /// Processing steps as their string labels.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.processing_steps.iter().map(ProcessingStep::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(Algorithm::Hybrid.to_string(), "hybrid");
        assert_eq!(ProcessingStep::EmptyQuery.to_string(), "empty-query");
        assert_eq!(ProcessingStep::FuzzyFallback.as_str(), "fuzzy-fallback");
    }

    #[test]
    fn time_in_millis() {
        let metrics = SearchMetrics {
            search_time: Duration::from_micros(1500),
            total_stations: 3,
            results_found: 0,
            cache_hit: false,
            algorithm: Algorithm::Trie,
            processing_steps: vec![ProcessingStep::TrieLookup, ProcessingStep::Ranking],
        };
        assert!((metrics.search_time_ms() - 1.5).abs() < 1e-9);
        assert_eq!(metrics.step_names(), vec!["trie-lookup", "ranking"]);
    }
}
