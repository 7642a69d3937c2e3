//! Relevance ranking for station search results.
//!
//! Each candidate is scored by summing weighted signals:
//! 1. How the name matched (exact, prefix, substring, fuzzy, or per-token)
//! 2. Whether the station is a transfer point
//! 3. Static popularity
//! 4. Number of lines served
//! 5. A penalty for names much longer than the query
//! 6. A small alphabetical tie-break
//!
//! Only the first signal decides whether a candidate matches at all.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use crate::domain::{Station, StationId};
use crate::matcher::similarity;
use crate::text::{char_len, find_all_char_ranges, normalize, split_tokens};

use super::result::MatchType;

/// Popularity scores are given on a 0–10 scale.
const POPULARITY_SCALE: f64 = 10.0;

/// Letters in the alphabet used by the position bonus.
const ALPHABET_LEN: f64 = 26.0;

/// Weights for each ranking signal.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingWeights {
    pub exact_match: f64,
    pub prefix_match: f64,
    pub substring_match: f64,
    /// Multiplied by name/query similarity.
    pub fuzzy_match: f64,

    /// Per-token scores used when the whole name does not match.
    pub token_exact: f64,
    pub token_prefix: f64,
    pub token_substring: f64,
    /// Multiplied by token similarity.
    pub token_fuzzy: f64,

    pub transfer_station: f64,
    /// Multiplied by popularity / 10.
    pub popularity: f64,
    /// Multiplied by ln(distinct lines).
    pub line_count: f64,
    /// Multiplied by (name length - query length) / 10; negative to penalize.
    pub length_penalty: f64,
    /// Multiplied by (1 - alphabet position of the first letter / 26).
    pub position_bonus: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            exact_match: 100.0,
            prefix_match: 80.0,
            substring_match: 60.0,
            fuzzy_match: 40.0,
            token_exact: 30.0,
            token_prefix: 20.0,
            token_substring: 15.0,
            token_fuzzy: 10.0,
            transfer_station: 20.0,
            popularity: 15.0,
            line_count: 10.0,
            length_penalty: -5.0,
            position_bonus: 5.0,
        }
    }
}

impl RankingWeights {
    fn all(&self) -> [(&'static str, f64); 13] {
        [
            ("exact_match", self.exact_match),
            ("prefix_match", self.prefix_match),
            ("substring_match", self.substring_match),
            ("fuzzy_match", self.fuzzy_match),
            ("token_exact", self.token_exact),
            ("token_prefix", self.token_prefix),
            ("token_substring", self.token_substring),
            ("token_fuzzy", self.token_fuzzy),
            ("transfer_station", self.transfer_station),
            ("popularity", self.popularity),
            ("line_count", self.line_count),
            ("length_penalty", self.length_penalty),
            ("position_bonus", self.position_bonus),
        ]
    }
}

/// Static popularity lookup, 0 (unknown) to 10 (busiest).
///
/// Values outside the scale are clamped on lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Popularity {
    scores: HashMap<StationId, f64>,
}

impl Popularity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the popularity of a station.
    pub fn insert(&mut self, id: StationId, score: f64) {
        self.scores.insert(id, score);
    }

    /// Popularity of a station on the 0–10 scale.
    pub fn get(&self, id: &StationId) -> f64 {
        match self.scores.get(id) {
            Some(score) if score.is_finite() => score.clamp(0.0, POPULARITY_SCALE),
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl FromIterator<(StationId, f64)> for Popularity {
    fn from_iter<I: IntoIterator<Item = (StationId, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Configuration for the ranking engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    pub weights: RankingWeights,

    /// Minimum similarity for a fuzzy name or token match.
    pub fuzzy_threshold: f64,

    /// Results scoring below this are dropped by [`RankingEngine::rank`].
    pub min_score: f64,

    /// Maximum number of results from [`RankingEngine::rank`].
    pub max_results: usize,

    pub popularity: Popularity,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            fuzzy_threshold: 0.7,
            min_score: 0.0,
            max_results: 50,
            popularity: Popularity::default(),
        }
    }
}

impl RankingConfig {
    /// Use the given popularity table.
    pub fn with_popularity(mut self, popularity: Popularity) -> Self {
        self.popularity = popularity;
        self
    }

    /// Check thresholds and weights.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(format!(
                "ranking fuzzy threshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            ));
        }
        if !self.min_score.is_finite() {
            return Err(format!("min_score must be finite, got {}", self.min_score));
        }
        if self.max_results == 0 {
            return Err("ranking max_results must be at least 1".to_string());
        }
        for (name, weight) in self.weights.all() {
            if !weight.is_finite() {
                return Err(format!("weight {name} must be finite, got {weight}"));
            }
        }
        Ok(())
    }
}

/// Per-signal contributions to a candidate's score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub exact_match: f64,
    pub prefix_match: f64,
    /// Whole-name substring score, or the summed token scores.
    pub substring_match: f64,
    pub fuzzy_match: f64,
    pub transfer_station: f64,
    pub popularity: f64,
    pub line_count: f64,
    pub length_penalty: f64,
    pub position_bonus: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    fn sum(&self) -> f64 {
        self.exact_match
            + self.prefix_match
            + self.substring_match
            + self.fuzzy_match
            + self.transfer_station
            + self.popularity
            + self.line_count
            + self.length_penalty
            + self.position_bonus
    }
}

/// A candidate with its score.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub station: Arc<Station>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// `None` when the name did not match the query in any way.
    pub match_type: Option<MatchType>,
    /// Character ranges of matched text within the normalized name.
    pub highlight_ranges: Vec<Range<usize>>,
}

/// Multi-signal relevance scorer.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Score, filter and order candidates.
    ///
    /// Candidates that do not match are dropped, as are those below
    /// `min_score`. At most `max_results` are returned, best first.
    pub fn rank(&self, candidates: &[Arc<Station>], query: &str) -> Vec<RankedResult> {
        let query = normalize(query);
        let mut ranked: Vec<RankedResult> = candidates
            .iter()
            .map(|station| self.score_normalized(station, &query, self.config.fuzzy_threshold))
            .filter(|r| r.match_type.is_some() && r.score >= self.config.min_score)
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.station.name.cmp(&b.station.name))
                .then_with(|| a.station.id.cmp(&b.station.id))
        });
        ranked.truncate(self.config.max_results);
        ranked
    }

    /// Score one candidate with the configured fuzzy threshold.
    pub fn score(&self, station: &Arc<Station>, query: &str) -> RankedResult {
        self.score_with_threshold(station, query, self.config.fuzzy_threshold)
    }

    /// Score one candidate, never filtering it out.
    ///
    /// A candidate that does not match still gets its bonus signals, with
    /// `match_type` set to `None`.
    pub fn score_with_threshold(
        &self,
        station: &Arc<Station>,
        query: &str,
        fuzzy_threshold: f64,
    ) -> RankedResult {
        self.score_normalized(station, &normalize(query), fuzzy_threshold)
    }

    fn score_normalized(
        &self,
        station: &Arc<Station>,
        query: &str,
        fuzzy_threshold: f64,
    ) -> RankedResult {
        let w = &self.config.weights;
        let name = normalize(&station.name);
        let name_len = char_len(&name);
        let query_len = char_len(query);

        let mut breakdown = ScoreBreakdown::default();
        let mut match_type = None;
        let mut highlight_ranges = Vec::new();

        if !query.is_empty() {
            if name == query {
                breakdown.exact_match = w.exact_match;
                match_type = Some(MatchType::Exact);
                highlight_ranges.push(0..name_len);
            } else if name.starts_with(query) {
                breakdown.prefix_match = w.prefix_match;
                match_type = Some(MatchType::Prefix);
                highlight_ranges.push(0..query_len);
            } else if name.contains(query) {
                breakdown.substring_match = w.substring_match;
                match_type = Some(MatchType::Substring);
                highlight_ranges = find_all_char_ranges(&name, query);
            } else {
                let sim = similarity(&name, query);
                if sim >= fuzzy_threshold {
                    breakdown.fuzzy_match = w.fuzzy_match * sim;
                    match_type = Some(MatchType::Fuzzy);
                }
            }

            if match_type.is_none() {
                let token_score = self.token_score(&name, query, fuzzy_threshold);
                if token_score > 0.0 {
                    breakdown.substring_match = token_score;
                    match_type = Some(MatchType::Token);
                    for token in split_tokens(query) {
                        highlight_ranges.extend(find_all_char_ranges(&name, &token));
                    }
                    highlight_ranges.sort_by_key(|r| r.start);
                }
            }
        }

        if station.is_transfer {
            breakdown.transfer_station = w.transfer_station;
        }

        breakdown.popularity =
            w.popularity * self.config.popularity.get(&station.id) / POPULARITY_SCALE;

        breakdown.line_count = w.line_count * (station.distinct_line_count() as f64).ln();

        let extra_chars = name_len.saturating_sub(query_len) as f64;
        breakdown.length_penalty = w.length_penalty * (extra_chars / 10.0);

        breakdown.position_bonus =
            w.position_bonus * (1.0 - alphabet_position(&name) / ALPHABET_LEN);

        breakdown.total = breakdown.sum();

        RankedResult {
            station: Arc::clone(station),
            score: breakdown.total,
            breakdown,
            match_type,
            highlight_ranges,
        }
    }

    /// Sum, over query tokens, of the best score against any name token.
    fn token_score(&self, name: &str, query: &str, fuzzy_threshold: f64) -> f64 {
        let w = &self.config.weights;
        let name_tokens = split_tokens(name);

        split_tokens(query)
            .iter()
            .map(|query_token| {
                name_tokens
                    .iter()
                    .map(|token| {
                        if token == query_token {
                            w.token_exact
                        } else if token.starts_with(query_token.as_str()) {
                            w.token_prefix
                        } else if token.contains(query_token.as_str()) {
                            w.token_substring
                        } else {
                            let sim = similarity(token, query_token);
                            if sim >= fuzzy_threshold {
                                w.token_fuzzy * sim
                            } else {
                                0.0
                            }
                        }
                    })
                    .fold(0.0, f64::max)
            })
            .sum()
    }
}

/// Zero-based position of the first letter in a–z, or 26 if not a letter.
fn alphabet_position(name: &str) -> f64 {
    match name.chars().next() {
        Some(c) if c.is_ascii_lowercase() => f64::from(c as u8 - b'a'),
        _ => ALPHABET_LEN,
    }
}
