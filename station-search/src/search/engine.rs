//! Search orchestrator.
//!
//! The engine indexes a fixed catalog once at construction and answers
//! queries through a fixed pipeline:
//!
//! 1. Reject invalid options, bail out early on a blank query
//! 2. Serve from the result cache if possible
//! 3. Prefix lookup in the trie, with a coarse score per hit
//! 4. Fuzzy fallback over the whole catalog when the trie finds few results
//! 5. Re-score with the ranking engine
//! 6. Drop transfer stations and add highlights if asked to
//! 7. Truncate and cache
//!
//! `search` takes `&mut self` because it updates the cache. An engine shared
//! between threads needs an external lock, or one engine per thread.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::cache::{CacheStats, Clock, LruCache, SystemClock};
use crate::domain::{Station, StationId};
use crate::index::{Trie, TrieStats};
use crate::matcher::{FuzzyMatcher, FuzzyStats};
use crate::stations::CatalogProvider;
use crate::text::{char_len, find_char_range, normalize};

use super::config::{EngineConfig, SearchOptions};
use super::error::SearchError;
use super::metrics::{Algorithm, ProcessingStep, SearchMetrics};
use super::rank::{RankedResult, RankingEngine};
use super::result::{MatchType, SearchResult, sort_by_score};

/// Coarse scores assigned to trie hits before ranking.
const TRIE_EXACT_SCORE: f64 = 100.0;
const TRIE_PREFIX_SCORE: f64 = 80.0;
const TRIE_SUBSTRING_SCORE: f64 = 60.0;
const TRIE_FUZZY_SCORE: f64 = 40.0;
const TRIE_TRANSFER_BONUS: f64 = 10.0;

/// The fuzzy fallback runs when the trie finds fewer results than this.
const FUZZY_FALLBACK_BELOW: usize = 5;

/// Results and metrics of one search.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub metrics: SearchMetrics,
}

/// Introspection counters for every engine component.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    pub stations: usize,
    pub trie: TrieStats,
    pub cache: CacheStats,
    pub fuzzy: FuzzyStats,
}

/// A station with its normalized name.
#[derive(Debug, Clone)]
struct IndexedStation {
    station: Arc<Station>,
    normalized: String,
}

/// Typo-tolerant station search over a fixed catalog.
#[derive(Debug)]
pub struct SearchEngine<C = SystemClock> {
    stations: Vec<Arc<Station>>,
    by_id: HashMap<StationId, IndexedStation>,
    trie: Trie,
    fuzzy: FuzzyMatcher,
    ranking: RankingEngine,
    cache: LruCache<String, Arc<Vec<SearchResult>>, C>,
    max_query_chars: usize,
}

impl SearchEngine<SystemClock> {
    /// Build an engine over `stations`.
    pub fn new(stations: Vec<Station>, config: EngineConfig) -> Result<Self, SearchError> {
        Self::with_clock(stations, config, SystemClock)
    }

    /// Load the catalog from `provider` and build an engine over it.
    pub fn from_provider(
        provider: &impl CatalogProvider,
        config: EngineConfig,
    ) -> Result<Self, SearchError> {
        let stations = provider.load()?;
        Self::new(stations, config)
    }
}

impl<C: Clock> SearchEngine<C> {
    /// Build an engine whose cache reads time from `clock`.
    pub fn with_clock(
        stations: Vec<Station>,
        config: EngineConfig,
        clock: C,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let capacity = config.cache.capacity().ok_or_else(|| {
            SearchError::InvalidConfig("cache capacity must be at least 1".to_string())
        })?;

        let stations: Vec<Arc<Station>> = stations.into_iter().map(Arc::new).collect();

        let mut by_id = HashMap::with_capacity(stations.len());
        let mut trie = Trie::new();
        for station in &stations {
            if by_id.contains_key(&station.id) {
                return Err(SearchError::DuplicateStation(station.id.clone()));
            }
            trie.insert(&station.name, &station.id);
            by_id.insert(
                station.id.clone(),
                IndexedStation {
                    station: Arc::clone(station),
                    normalized: normalize(&station.name),
                },
            );
        }

        let fuzzy = FuzzyMatcher::new(&stations, config.fuzzy);
        let ranking = RankingEngine::new(config.ranking);
        let cache = LruCache::with_clock(capacity, config.cache.ttl, clock);

        let trie_stats = trie.stats();
        info!(
            stations = stations.len(),
            trie_nodes = trie_stats.nodes,
            trie_words = trie_stats.words,
            tokens = fuzzy.stats().tokens,
            "built station search index"
        );

        Ok(Self {
            stations,
            by_id,
            trie,
            fuzzy,
            ranking,
            cache,
            max_query_chars: config.max_query_chars,
        })
    }

    /// Search the catalog.
    ///
    /// A blank query, or one matching nothing, gives an empty result list
    /// rather than an error.
    ///
    /// Cached results are keyed on the normalized query alone and stored
    /// after filtering, highlighting and truncation. A cache hit returns
    /// them as stored, cut to `max_results`, whatever the other options say.
    /// Pass `enable_cache = false` when searching the same query with
    /// different options, or call [`SearchEngine::clear_cache`] in between.
    pub fn search(
        &mut self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();
        options.validate()?;

        let len = char_len(query);
        if len > self.max_query_chars {
            return Err(SearchError::QueryTooLong {
                len,
                max: self.max_query_chars,
            });
        }

        let normalized = normalize(query);
        let mut steps = Vec::new();

        if normalized.is_empty() {
            steps.push(ProcessingStep::EmptyQuery);
            return Ok(self.respond(Vec::new(), Algorithm::Trie, false, steps, started));
        }

        if options.enable_cache {
            if let Some(cached) = self.cache.get(normalized.as_str()) {
                let results: Vec<SearchResult> =
                    cached.iter().take(options.max_results).cloned().collect();
                steps.push(ProcessingStep::CacheHit);
                trace!(query = %normalized, "served from cache");
                let response = self.respond(results, Algorithm::Cache, true, steps, started);
                log_response(&normalized, &response);
                return Ok(response);
            }
            steps.push(ProcessingStep::CacheMiss);
        }

        let mut results = self.trie_lookup(&normalized);
        steps.push(ProcessingStep::TrieLookup);
        let trie_count = results.len();
        trace!(query = %normalized, found = trie_count, "trie lookup");

        let fallback_below = FUZZY_FALLBACK_BELOW.min(options.max_results);
        let mut fuzzy_ran = false;
        let mut fuzzy_added = 0;
        if options.enable_fuzzy && trie_count < fallback_below {
            fuzzy_added = self.fuzzy_fallback(query, options, &mut results);
            fuzzy_ran = true;
            steps.push(ProcessingStep::FuzzyFallback);
            trace!(query = %normalized, added = fuzzy_added, "fuzzy fallback");
        }

        let mut ranked = false;
        if options.sort_by_relevance && results.len() > 1 {
            self.rerank(&mut results, &normalized, options.fuzzy_threshold);
            ranked = true;
            steps.push(ProcessingStep::Ranking);
        }

        if !options.include_transfer_stations {
            results.retain(|r| !r.station.is_transfer);
            steps.push(ProcessingStep::Filtering);
        }

        if options.highlight_matches {
            self.highlight(&mut results, &normalized);
            steps.push(ProcessingStep::Highlighting);
        }

        results.truncate(options.max_results);

        if options.enable_cache && !results.is_empty() {
            self.cache
                .set(normalized.clone(), Arc::new(results.clone()));
            steps.push(ProcessingStep::CacheStore);
        }

        let algorithm = if fuzzy_ran && trie_count == 0 {
            Algorithm::Fuzzy
        } else if fuzzy_added > 0 {
            Algorithm::Hybrid
        } else if ranked {
            Algorithm::Ranking
        } else {
            Algorithm::Trie
        };

        let response = self.respond(results, algorithm, false, steps, started);
        log_response(&normalized, &response);
        Ok(response)
    }

    /// Normalized completions of `prefix`, in lexicographic order.
    pub fn get_suggestions(&self, prefix: &str, limit: usize) -> Vec<String> {
        if normalize(prefix).is_empty() {
            return Vec::new();
        }
        self.trie.get_completions(prefix, limit)
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            stations: self.stations.len(),
            trie: self.trie.stats(),
            cache: self.cache.stats(),
            fuzzy: self.fuzzy.stats(),
        }
    }

    /// Drop every cached result and reset the hit/miss counters.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        debug!("cleared search cache");
    }

    /// Drop expired cached results. Returns how many were removed.
    pub fn clean_expired_cache(&mut self) -> usize {
        self.cache.clean_expired()
    }

    /// Look up a station by id.
    pub fn station(&self, id: &StationId) -> Option<&Arc<Station>> {
        self.by_id.get(id).map(|entry| &entry.station)
    }

    /// Every station, in catalog order.
    pub fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Trie hits with coarse scores, best first.
    fn trie_lookup(&self, query: &str) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .trie
            .find_by_prefix(query)
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .map(|entry| coarse_result(entry, query))
            .collect();
        sort_by_score(&mut results);
        results
    }

    /// Append fuzzy matches not already present. Returns how many were added.
    fn fuzzy_fallback(
        &self,
        query: &str,
        options: &SearchOptions,
        results: &mut Vec<SearchResult>,
    ) -> usize {
        let mut seen: HashSet<StationId> = results.iter().map(|r| r.station.id.clone()).collect();
        let before = results.len();

        for found in self
            .fuzzy
            .search_with_threshold(query, options.max_results, options.fuzzy_threshold)
        {
            if seen.insert(found.station.id.clone()) {
                results.push(SearchResult::from(found));
            }
        }

        results.len() - before
    }

    fn rerank(&self, results: &mut [SearchResult], query: &str, fuzzy_threshold: f64) {
        for result in results.iter_mut() {
            let ranked = self
                .ranking
                .score_with_threshold(&result.station, query, fuzzy_threshold);
            apply_ranking(result, ranked);
        }
        sort_by_score(results);
    }

    fn highlight(&self, results: &mut [SearchResult], query: &str) {
        for result in results.iter_mut() {
            let range = self
                .by_id
                .get(&result.station.id)
                .and_then(|entry| find_char_range(&entry.normalized, query));
            result.highlights = Some(range.into_iter().collect());
        }
    }

    fn respond(
        &self,
        results: Vec<SearchResult>,
        algorithm: Algorithm,
        cache_hit: bool,
        processing_steps: Vec<ProcessingStep>,
        started: Instant,
    ) -> SearchResponse {
        let metrics = SearchMetrics {
            search_time: started.elapsed(),
            total_stations: self.stations.len(),
            results_found: results.len(),
            cache_hit,
            algorithm,
            processing_steps,
        };
        SearchResponse { results, metrics }
    }
}

/// Classify a trie hit against the specific query.
fn coarse_result(entry: &IndexedStation, query: &str) -> SearchResult {
    let name = entry.normalized.as_str();
    let (mut score, match_type) = if name == query {
        (TRIE_EXACT_SCORE, MatchType::Exact)
    } else if name.starts_with(query) {
        (TRIE_PREFIX_SCORE, MatchType::Prefix)
    } else if name.contains(query) {
        (TRIE_SUBSTRING_SCORE, MatchType::Substring)
    } else {
        (TRIE_FUZZY_SCORE, MatchType::Fuzzy)
    };

    if entry.station.is_transfer {
        score += TRIE_TRANSFER_BONUS;
    }

    SearchResult::new(Arc::clone(&entry.station), score, match_type)
}

/// The ranking score always replaces the coarse score. The match type is
/// only replaced when the ranking engine classified the match.
fn apply_ranking(result: &mut SearchResult, ranked: RankedResult) {
    result.score = ranked.score;
    if let Some(match_type) = ranked.match_type {
        result.match_type = match_type;
    }
}

fn log_response(query: &str, response: &SearchResponse) {
    let metrics = &response.metrics;
    debug!(
        query,
        results = metrics.results_found,
        cache_hit = metrics.cache_hit,
        algorithm = %metrics.algorithm,
        elapsed_ms = metrics.search_time_ms(),
        "search complete"
    );
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
