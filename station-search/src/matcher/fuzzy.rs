//! Typo-tolerant matching over the whole catalog.
//!
//! Each candidate gets a primary score from the first structural match that
//! applies (exact, prefix, substring, then edit distance), plus token-level
//! scores and a small relevance bonus on top.

use std::sync::Arc;

use crate::domain::Station;
use crate::text::{char_len, fold, split_tokens};

use super::distance::{is_transposition, levenshtein, similarity};

const EXACT_SCORE: f64 = 10.0;
const PREFIX_SCORE: f64 = 8.0;
const SUBSTRING_SCORE: f64 = 5.0;
const FUZZY_SCALE: f64 = 4.0;
const TOKEN_SCALE: f64 = 2.0;
const RELEVANCE_SCALE: f64 = 0.5;

/// Candidates without any structural match need at least this score.
const MIN_UNMATCHED_SCORE: f64 = 1.0;

/// Configuration for the fuzzy matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyConfig {
    /// Minimum similarity in `[0, 1]` for an edit-distance match.
    pub threshold: f64,

    /// Maximum Levenshtein distance for an edit-distance match.
    pub max_distance: usize,

    /// Compare case-sensitively.
    pub case_sensitive: bool,

    /// Strip diacritics before comparing.
    pub ignore_accents: bool,

    /// Allow a query token to match the start of a longer candidate token.
    pub match_partial_words: bool,

    /// Added when the edit is a single adjacent swap.
    pub transpose_bonus: f64,

    /// Added to the prefix base score.
    pub prefix_bonus: f64,

    /// Added to the substring base score.
    pub substring_bonus: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            max_distance: 3,
            case_sensitive: false,
            ignore_accents: true,
            match_partial_words: true,
            transpose_bonus: 0.5,
            prefix_bonus: 1.0,
            substring_bonus: 0.5,
        }
    }
}

impl FuzzyConfig {
    /// Set the similarity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the maximum edit distance.
    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Check that the threshold is a probability and bonuses are non-negative.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "fuzzy threshold must be within [0, 1], got {}",
                self.threshold
            ));
        }

        for (name, bonus) in [
            ("transpose_bonus", self.transpose_bonus),
            ("prefix_bonus", self.prefix_bonus),
            ("substring_bonus", self.substring_bonus),
        ] {
            if !bonus.is_finite() || bonus < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {bonus}"));
            }
        }

        Ok(())
    }
}

/// How a query matched a candidate string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    Fuzzy,
    /// Edit-distance match that is a single adjacent swap.
    Transposition,
}

/// What part of the candidate a match was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTarget {
    /// The whole folded name.
    Name,
    /// One token of the name.
    Token,
}

/// A single structural match found while scoring a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchInfo {
    pub kind: MatchKind,
    pub target: MatchTarget,
    /// The folded name or token that matched.
    pub text: String,
    /// Match strength in `[0, 1]`.
    pub confidence: f64,
}

/// A candidate accepted by the fuzzy matcher.
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    pub station: Arc<Station>,
    pub score: f64,
    /// Edit distance between the folded name and query.
    pub distance: usize,
    pub similarity: f64,
    pub matches: Vec<MatchInfo>,
}

impl FuzzyMatch {
    /// Kind of the whole-name match, if the name matched as a whole.
    pub fn name_match(&self) -> Option<MatchKind> {
        self.matches
            .iter()
            .find(|m| m.target == MatchTarget::Name)
            .map(|m| m.kind)
    }
}

/// Introspection counters for the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyStats {
    /// Number of indexed candidates.
    pub entries: usize,
    /// Total number of indexed tokens.
    pub tokens: usize,
}

/// A candidate with its folded forms precomputed.
#[derive(Debug, Clone)]
struct Entry {
    station: Arc<Station>,
    folded: String,
    tokens: Vec<String>,
}

/// Fuzzy matcher over a fixed set of stations.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    entries: Vec<Entry>,
    config: FuzzyConfig,
}

impl FuzzyMatcher {
    /// Fold and tokenize every station name once.
    pub fn new(stations: &[Arc<Station>], config: FuzzyConfig) -> Self {
        let entries = stations
            .iter()
            .map(|station| {
                let folded = fold(&station.name, config.case_sensitive, config.ignore_accents);
                let tokens = split_tokens(&folded);
                Entry {
                    station: Arc::clone(station),
                    folded,
                    tokens,
                }
            })
            .collect();

        Self { entries, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    /// Search with the configured similarity threshold.
    pub fn search(&self, query: &str, limit: usize) -> Vec<FuzzyMatch> {
        self.search_with_threshold(query, limit, self.config.threshold)
    }

    /// Search with an explicit similarity threshold.
    ///
    /// Returns at most `limit` matches, best first. Ties are broken by name.
    pub fn search_with_threshold(
        &self,
        query: &str,
        limit: usize,
        threshold: f64,
    ) -> Vec<FuzzyMatch> {
        let folded_query = self.fold(query);
        if folded_query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let query_tokens = split_tokens(&folded_query);

        let mut matches: Vec<FuzzyMatch> = self
            .entries
            .iter()
            .filter_map(|entry| self.score_entry(entry, &folded_query, &query_tokens, threshold))
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.station.name.cmp(&b.station.name))
        });
        matches.truncate(limit);
        matches
    }

    /// Candidate and token counts.
    pub fn stats(&self) -> FuzzyStats {
        FuzzyStats {
            entries: self.entries.len(),
            tokens: self.entries.iter().map(|e| e.tokens.len()).sum(),
        }
    }

    fn fold(&self, text: &str) -> String {
        fold(text, self.config.case_sensitive, self.config.ignore_accents)
    }

    fn score_entry(
        &self,
        entry: &Entry,
        query: &str,
        query_tokens: &[String],
        threshold: f64,
    ) -> Option<FuzzyMatch> {
        let name = entry.folded.as_str();
        let name_len = char_len(name);
        let query_len = char_len(query);
        let coverage = query_len as f64 / name_len.max(1) as f64;

        let mut matches = Vec::new();
        let mut score;
        let distance;
        let sim;

        if name == query {
            score = EXACT_SCORE;
            distance = 0;
            sim = 1.0;
            matches.push(name_match(MatchKind::Exact, name, 1.0));
        } else if name.starts_with(query) {
            score = PREFIX_SCORE + self.config.prefix_bonus;
            distance = name_len - query_len;
            sim = coverage;
            matches.push(name_match(MatchKind::Prefix, name, coverage));
        } else if name.contains(query) {
            score = SUBSTRING_SCORE + self.config.substring_bonus;
            distance = name_len.saturating_sub(query_len);
            sim = coverage;
            matches.push(name_match(MatchKind::Substring, name, coverage));
        } else {
            distance = levenshtein(name, query);
            sim = similarity(name, query);
            score = 0.0;
            if distance <= self.config.max_distance && sim >= threshold {
                score = sim * FUZZY_SCALE;
                let kind = if is_transposition(name, query) {
                    score += self.config.transpose_bonus;
                    MatchKind::Transposition
                } else {
                    MatchKind::Fuzzy
                };
                matches.push(name_match(kind, name, sim));
            }
        }

        for query_token in query_tokens {
            let best = entry
                .tokens
                .iter()
                .filter_map(|token| {
                    self.match_token(query_token, token, threshold)
                        .map(|(kind, confidence)| (kind, confidence, token))
                })
                .max_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((kind, confidence, token)) = best {
                score += confidence * TOKEN_SCALE;
                matches.push(MatchInfo {
                    kind,
                    target: MatchTarget::Token,
                    text: token.clone(),
                    confidence,
                });
            }
        }

        score += RELEVANCE_SCALE * base_relevance(name, query);

        if matches.is_empty() && score < MIN_UNMATCHED_SCORE {
            return None;
        }

        Some(FuzzyMatch {
            station: Arc::clone(&entry.station),
            score,
            distance,
            similarity: sim,
            matches,
        })
    }

    /// Match one query token against one candidate token.
    fn match_token(&self, query: &str, token: &str, threshold: f64) -> Option<(MatchKind, f64)> {
        if query == token {
            return Some((MatchKind::Exact, 1.0));
        }

        if self.config.match_partial_words && token.starts_with(query) {
            let coverage = char_len(query) as f64 / char_len(token) as f64;
            return Some((MatchKind::Prefix, 0.5 + 0.5 * coverage));
        }

        let distance = levenshtein(query, token);
        let sim = similarity(query, token);
        if distance <= self.config.max_distance && sim >= threshold {
            return Some((MatchKind::Fuzzy, 0.8 * sim));
        }

        None
    }
}

fn name_match(kind: MatchKind, name: &str, confidence: f64) -> MatchInfo {
    MatchInfo {
        kind,
        target: MatchTarget::Name,
        text: name.to_string(),
        confidence,
    }
}

/// Generic relevance in `[0, 1]` independent of match classification.
///
/// Averages length closeness, a shared first character, and the share of
/// query characters present anywhere in the candidate.
pub fn base_relevance(candidate: &str, query: &str) -> f64 {
    let candidate_len = char_len(candidate);
    let query_len = char_len(query);
    if candidate_len == 0 || query_len == 0 {
        return 0.0;
    }

    let length_ratio = candidate_len.min(query_len) as f64 / candidate_len.max(query_len) as f64;

    let same_start = match (candidate.chars().next(), query.chars().next()) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    };

    let present = query.chars().filter(|&c| candidate.contains(c)).count();
    let shared = present as f64 / query_len as f64;

    (length_ratio + same_start + shared) / 3.0
}
