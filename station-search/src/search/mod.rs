//! Station search: query pipeline, ranking and result types.
//!
//! [`SearchEngine`] is the entry point. It owns the trie, fuzzy matcher,
//! ranking engine and result cache, all built from one catalog snapshot.

mod config;
mod engine;
mod error;
mod metrics;
mod rank;
mod result;

pub use config::{EngineConfig, SearchOptions};
pub use engine::{EngineStats, SearchEngine, SearchResponse};
pub use error::SearchError;
pub use metrics::{Algorithm, ProcessingStep, SearchMetrics};
pub use rank::{
    Popularity, RankedResult, RankingConfig, RankingEngine, RankingWeights, ScoreBreakdown,
};
pub use result::{MatchType, SearchResult};
