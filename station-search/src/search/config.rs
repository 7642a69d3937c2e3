//! Configuration for the search engine and individual searches.

use crate::cache::CacheConfig;
use crate::matcher::FuzzyConfig;

use super::error::SearchError;
use super::rank::RankingConfig;

/// Per-query search options.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of results to return.
    pub max_results: usize,

    /// Fall back to fuzzy matching when prefix lookup finds few results.
    pub enable_fuzzy: bool,

    /// Read and write the result cache.
    pub enable_cache: bool,

    /// Minimum similarity for fuzzy matches, in `[0, 1]`.
    pub fuzzy_threshold: f64,

    /// Keep stations that serve more than one line.
    pub include_transfer_stations: bool,

    /// Re-score candidates with the ranking engine.
    pub sort_by_relevance: bool,

    /// Record where the query occurs in each result's name.
    pub highlight_matches: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            enable_fuzzy: true,
            enable_cache: true,
            fuzzy_threshold: 0.7,
            include_transfer_stations: true,
            sort_by_relevance: true,
            highlight_matches: false,
        }
    }
}

impl SearchOptions {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_fuzzy(mut self, enable: bool) -> Self {
        self.enable_fuzzy = enable;
        self
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    pub fn with_transfer_stations(mut self, include: bool) -> Self {
        self.include_transfer_stations = include;
        self
    }

    pub fn with_relevance_sort(mut self, enable: bool) -> Self {
        self.sort_by_relevance = enable;
        self
    }

    pub fn with_highlights(mut self, enable: bool) -> Self {
        self.highlight_matches = enable;
        self
    }

    /// Reject options that cannot produce a meaningful search.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::InvalidOptions(
                "max_results must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(SearchError::InvalidOptions(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        Ok(())
    }
}

/// Configuration fixed when the engine is built.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub fuzzy: FuzzyConfig,
    pub ranking: RankingConfig,

    /// Longest accepted query, in characters.
    pub max_query_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            fuzzy: FuzzyConfig::default(),
            ranking: RankingConfig::default(),
            max_query_chars: 100,
        }
    }
}

impl EngineConfig {
    /// Create a configuration from its parts.
    pub fn new(
        cache: CacheConfig,
        fuzzy: FuzzyConfig,
        ranking: RankingConfig,
        max_query_chars: usize,
    ) -> Self {
        Self {
            cache,
            fuzzy,
            ranking,
            max_query_chars,
        }
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_fuzzy(mut self, fuzzy: FuzzyConfig) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_max_query_chars(mut self, max_query_chars: usize) -> Self {
        self.max_query_chars = max_query_chars;
        self
    }

    /// Check every component configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.cache.capacity().is_none() {
            return Err(SearchError::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        if self.max_query_chars == 0 {
            return Err(SearchError::InvalidConfig(
                "max_query_chars must be at least 1".to_string(),
            ));
        }
        self.fuzzy.validate().map_err(SearchError::InvalidConfig)?;
        self.ranking.validate().map_err(SearchError::InvalidConfig)?;
        Ok(())
    }
}
